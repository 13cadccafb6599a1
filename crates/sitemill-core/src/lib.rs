//! # sitemill-core
//!
//! Incremental, streaming parser for XML sitemaps and sitemap indexes.
//!
//! Response bodies are consumed chunk by chunk as they arrive. The first chunk
//! decides whether a body is a `<sitemapindex>`, a `<urlset>` or something
//! else; after that, every complete `<url>` or `<sitemap>` element is turned
//! into a [`SitemapRecord`] as soon as its closing tag arrives, no matter
//! where the chunk boundaries fall. Index entries can be followed by issuing
//! new fetches through the crawl host.
//!
//! ## Architecture
//!
//! - **Sniffing**: [`sniff`] detects the document type from the opening chunk
//! - **Extraction**: [`extract::StreamState`] keeps the partial-record buffer
//!   and [`fragment`] parses closed segments
//! - **Records**: [`record`] coerces field text into dates, frequencies and
//!   priorities
//! - **Parser**: [`SitemapParser`] applies filters, runs one
//!   [`SitemapStream`] per response and follows index entries
//! - **Host contract**: [`host`] defines what a crawl framework provides;
//!   [`HttpCrawler`] is a ready-made reqwest implementation
//!
//! ## Quick Start
//!
//! ```rust
//! use sitemill_core::{CrawlCallback, CrawlHost, CrawlRequest, ResponseContext, SitemapParser};
//! use std::sync::Arc;
//!
//! struct Offline;
//!
//! impl CrawlHost for Offline {
//!     fn crawl(&self, request: CrawlRequest, callback: CrawlCallback) {
//!         println!("would fetch {}", request.url);
//!         callback(Ok(()));
//!     }
//! }
//!
//! let parser = SitemapParser::builder(Arc::new(Offline)).build();
//! let context = ResponseContext::new("https://example.com/sitemap.xml", Some("text/xml"));
//!
//! if let Some(mut stream) = parser.open_stream(context) {
//!     stream.push_chunk(b"<urlset><url><loc>https://example.com/</loc><prio");
//!     stream.push_chunk(b"rity>0.8</priority></url></urlset>");
//!     stream.finish();
//! }
//!
//! let record = parser.cumulative().get("https://example.com/").unwrap();
//! assert_eq!(record.priority(), Some(0.8));
//! ```
//!
//! ## Error Handling
//!
//! Malformed XML never fails: missing or unreadable fields come back as
//! `None` and unknown documents are skipped. The only errors a parser reports
//! are failed follow-up fetches, delivered to its `on_error` handler.

/// Parser options, filters and settings files
pub mod config;
/// Error types and result aliases
pub mod error;
/// Incremental record extraction
pub mod extract;
/// Parsing of closed record segments
pub mod fragment;
/// Injected data and error handlers
pub mod handlers;
/// Host contract for crawl frameworks
pub mod host;
/// reqwest-backed crawl host
pub mod http;
/// Sitemap parser and per-response streams
pub mod parser;
/// Sitemap records and field coercion
pub mod record;
/// Per-stream and cumulative record maps
pub mod result_map;
/// Document type sniffing
pub mod sniff;

// Re-export commonly used types
pub use config::{
    AcceptAll, FetchSettings, ParserOptions, ParserSettings, PredicateFilter, ValueFilter,
};
pub use error::{Error, Result};
pub use handlers::Handlers;
pub use host::{
    ChunkHandler, CrawlCallback, CrawlHost, CrawlRequest, RequestParameters, ResponseContext,
    ResponseProcessor,
};
pub use http::HttpCrawler;
pub use parser::{SitemapParser, SitemapParserBuilder, SitemapStream};
pub use record::{ChangeFrequency, SitemapRecord};
pub use result_map::{CumulativeMap, ResultMap};
pub use sniff::DocumentKind;
