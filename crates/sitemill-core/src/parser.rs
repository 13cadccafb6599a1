//! The sitemap parser: filter gate, per-response streams and index-following.
//!
//! A [`SitemapParser`] is built once per crawl session around a
//! [`CrawlHost`]. For every response the host reports, the parser checks the
//! marker and the three filters; accepted responses get a [`SitemapStream`]
//! that extracts records chunk by chunk. Records go into the stream's own map
//! and into the parser's [`CumulativeMap`]. Index entries are fetched again
//! through the host when `follow` is on, marked so the child responses can
//! be told apart.
//!
//! ```rust
//! use sitemill_core::{CrawlCallback, CrawlHost, CrawlRequest, ResponseContext, SitemapParser};
//! use std::sync::Arc;
//!
//! struct NoopHost;
//!
//! impl CrawlHost for NoopHost {
//!     fn crawl(&self, _request: CrawlRequest, callback: CrawlCallback) {
//!         callback(Ok(()));
//!     }
//! }
//!
//! let parser = SitemapParser::builder(Arc::new(NoopHost))
//!     .on_data(|records, context| println!("{}: {} records", context.url, records.len()))
//!     .build();
//!
//! let context = ResponseContext::new("https://example.com/sitemap.xml", Some("application/xml"));
//! let mut stream = parser.open_stream(context).expect("accepted");
//! stream.push_chunk(b"<urlset><url><loc>https://example.com/</loc></url></urlset>");
//! stream.finish();
//!
//! assert!(parser.cumulative().contains("https://example.com/"));
//! ```

use crate::config::ParserOptions;
use crate::extract::StreamState;
use crate::handlers::Handlers;
use crate::host::{ChunkHandler, CrawlHost, CrawlRequest, ResponseContext, ResponseProcessor};
use crate::result_map::{CumulativeMap, ResultMap};
use crate::sniff::DocumentKind;
use crate::{Error, Result};
use std::fmt;
use std::sync::Arc;

struct Shared {
    options: ParserOptions,
    handlers: Handlers,
    host: Arc<dyn CrawlHost>,
    cumulative: CumulativeMap,
}

/// Incremental sitemap parser for one crawl session.
///
/// Cloning is cheap and clones share the cumulative map.
#[derive(Clone)]
pub struct SitemapParser {
    shared: Arc<Shared>,
}

impl SitemapParser {
    /// Start building a parser that issues follow-up fetches through `host`.
    pub fn builder(host: Arc<dyn CrawlHost>) -> SitemapParserBuilder {
        SitemapParserBuilder {
            host,
            options: ParserOptions::default(),
            handlers: Handlers::default(),
        }
    }

    /// Options the parser runs with.
    #[must_use]
    pub fn options(&self) -> &ParserOptions {
        &self.shared.options
    }

    /// Every record seen by every stream of this parser.
    #[must_use]
    pub fn cumulative(&self) -> &CumulativeMap {
        &self.shared.cumulative
    }

    /// Whether a response passes the marker check and all three filters.
    #[must_use]
    pub fn accepts(&self, context: &ResponseContext) -> bool {
        let options = &self.shared.options;

        if options.only_marked && !context.marked {
            tracing::debug!(url = %context.url, "Skipping unmarked response");
            return false;
        }

        let content_type = context.content_type.as_deref().unwrap_or_default();
        if !options.filter_content_type.test(content_type) {
            tracing::debug!(url = %context.url, content_type, "Content type filtered out");
            return false;
        }

        if !options.filter_status_code.test(&context.status.to_string()) {
            tracing::debug!(url = %context.url, status = context.status, "Status code filtered out");
            return false;
        }

        if !options.filter_url.test(&context.url) {
            tracing::debug!(url = %context.url, "URL filtered out");
            return false;
        }

        true
    }

    /// Open a stream for an accepted response.
    ///
    /// Returns `None` when the response is passed through untouched.
    #[must_use]
    pub fn open_stream(&self, context: ResponseContext) -> Option<SitemapStream> {
        if !self.accepts(&context) {
            return None;
        }

        tracing::debug!(url = %context.url, marked = context.marked, "Opening sitemap stream");
        Some(SitemapStream {
            state: StreamState::new(),
            context: Arc::new(context),
            shared: Arc::clone(&self.shared),
        })
    }
}

impl ResponseProcessor for SitemapParser {
    fn begin(&self, context: &ResponseContext) -> Option<Box<dyn ChunkHandler>> {
        self.open_stream(context.clone())
            .map(|stream| Box::new(stream) as Box<dyn ChunkHandler>)
    }
}

impl fmt::Debug for SitemapParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SitemapParser")
            .field("options", &self.shared.options)
            .field("cumulative", &self.shared.cumulative.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`SitemapParser`].
#[must_use]
pub struct SitemapParserBuilder {
    host: Arc<dyn CrawlHost>,
    options: ParserOptions,
    handlers: Handlers,
}

impl SitemapParserBuilder {
    /// Use these options instead of the defaults.
    pub fn options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace both handlers at once.
    pub fn handlers(mut self, handlers: Handlers) -> Self {
        self.handlers = handlers;
        self
    }

    /// Handle the records of every drained sitemap stream.
    pub fn on_data<F>(mut self, handler: F) -> Self
    where
        F: Fn(ResultMap, &ResponseContext) + Send + Sync + 'static,
    {
        self.handlers = self.handlers.on_data(handler);
        self
    }

    /// Handle failures of follow-up fetches.
    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(Error, &ResponseContext) + Send + Sync + 'static,
    {
        self.handlers = self.handlers.on_error(handler);
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> SitemapParser {
        SitemapParser {
            shared: Arc::new(Shared {
                options: self.options,
                handlers: self.handlers,
                host: self.host,
                cumulative: CumulativeMap::new(),
            }),
        }
    }
}

/// Processing state for the body of one accepted response.
pub struct SitemapStream {
    state: StreamState,
    context: Arc<ResponseContext>,
    shared: Arc<Shared>,
}

impl SitemapStream {
    /// Context of the response this stream reads.
    #[must_use]
    pub fn context(&self) -> &ResponseContext {
        &self.context
    }

    /// Document type sniffed so far.
    #[must_use]
    pub const fn kind(&self) -> DocumentKind {
        self.state.kind()
    }

    /// Feed the next body chunk.
    ///
    /// Completed records are stored in the cumulative map; index entries are
    /// handed to the host when following is enabled.
    pub fn push_chunk(&mut self, chunk: &[u8]) {
        let stored = self.state.push_chunk(chunk);
        let follow = self.state.kind() == DocumentKind::Index && self.shared.options.follow;

        for record in stored {
            if follow {
                self.follow(record.loc());
            }
            self.shared.cumulative.insert(record);
        }
    }

    /// End the stream, delivering its records to `on_data` if it was a
    /// sitemap.
    pub fn finish(self) {
        let Self { state, context, shared } = self;
        match state.finish() {
            Some(records) => {
                tracing::debug!(url = %context.url, records = records.len(), "Sitemap stream finished");
                shared.handlers.emit_data(records, &context);
            },
            None => tracing::debug!(url = %context.url, "Not a sitemap, nothing to deliver"),
        }
    }

    fn follow(&self, loc: &str) {
        tracing::debug!(parent = %self.context.url, url = %loc, "Following sitemap index entry");

        let shared = Arc::clone(&self.shared);
        let context = Arc::clone(&self.context);
        let callback = Box::new(move |outcome: Result<()>| {
            if let Err(error) = outcome {
                shared.handlers.emit_error(error, &context);
            }
        });

        self.shared.host.crawl(CrawlRequest::sitemap(loc), callback);
    }
}

impl ChunkHandler for SitemapStream {
    fn handle_chunk(&mut self, chunk: &[u8]) {
        self.push_chunk(chunk);
    }

    fn handle_end(self: Box<Self>) {
        self.finish();
    }
}

impl fmt::Debug for SitemapStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SitemapStream")
            .field("url", &self.context.url)
            .field("kind", &self.state.kind())
            .finish_non_exhaustive()
    }
}
