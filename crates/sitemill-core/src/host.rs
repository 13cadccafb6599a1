//! The contract between a sitemap parser and the crawl host that drives it.
//!
//! A host fetches URLs and, for every response, asks its
//! [`ResponseProcessor`] whether it wants the body. If it does, the host
//! feeds every body chunk, in order and one at a time, into the returned
//! [`ChunkHandler`] and calls [`ChunkHandler::handle_end`] once the body is
//! drained. In the other direction the processor enqueues new fetches
//! through [`CrawlHost::crawl`].

use crate::Result;
use serde::{Deserialize, Serialize};

/// What a processor knows about a response before reading its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseContext {
    /// Final URL of the response.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Value of the `content-type` header, if present.
    pub content_type: Option<String>,
    /// Whether the request was issued by index-following.
    pub marked: bool,
}

impl ResponseContext {
    /// Context for a successful, unmarked response.
    pub fn new(url: impl Into<String>, content_type: Option<&str>) -> Self {
        Self {
            url: url.into(),
            status: 200,
            content_type: content_type.map(str::to_string),
            marked: false,
        }
    }

    /// Set the status code.
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Set whether the originating request was marked.
    #[must_use]
    pub const fn with_marked(mut self, marked: bool) -> Self {
        self.marked = marked;
        self
    }
}

/// Parameters attached to a crawl request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestParameters {
    /// Set on requests issued by index-following.
    pub sitemap: bool,
}

/// A fetch the processor asks the host to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlRequest {
    /// URL to fetch.
    pub url: String,
    /// Request parameters.
    pub parameters: RequestParameters,
}

impl CrawlRequest {
    /// A plain request with no marker.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            parameters: RequestParameters::default(),
        }
    }

    /// A request marked as coming from index-following.
    pub fn sitemap(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            parameters: RequestParameters { sitemap: true },
        }
    }
}

/// Completion callback for [`CrawlHost::crawl`], invoked once with the fetch
/// outcome.
pub type CrawlCallback = Box<dyn FnOnce(Result<()>) + Send>;

/// The host's fetch operation.
pub trait CrawlHost: Send + Sync {
    /// Enqueue a fetch and return without waiting for it.
    fn crawl(&self, request: CrawlRequest, callback: CrawlCallback);
}

/// Receives the body of one response.
pub trait ChunkHandler: Send {
    /// Process the next chunk of the body.
    fn handle_chunk(&mut self, chunk: &[u8]);

    /// The body is fully drained.
    fn handle_end(self: Box<Self>);
}

/// Decides, per response, whether and how its body is processed.
pub trait ResponseProcessor: Send + Sync {
    /// Return a handler for the body, or `None` to let the response pass
    /// through untouched.
    fn begin(&self, context: &ResponseContext) -> Option<Box<dyn ChunkHandler>>;
}
