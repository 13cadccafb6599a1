//! A reqwest-backed crawl host.
//!
//! [`HttpCrawler`] implements [`CrawlHost`] on top of a tokio runtime. Every
//! crawl request becomes a spawned task that sends a GET, asks the attached
//! [`ResponseProcessor`] for a chunk handler, and streams the body into it as
//! it arrives. Fetches are fire-and-forget; [`HttpCrawler::wait_idle`] is how
//! a caller learns that recursive following has run its course.
//!
//! ```rust,no_run
//! use sitemill_core::{FetchSettings, HttpCrawler, SitemapParser};
//! use std::sync::Arc;
//!
//! # async fn demo() -> sitemill_core::Result<()> {
//! let crawler = Arc::new(HttpCrawler::new(&FetchSettings::default())?);
//! let parser = Arc::new(
//!     SitemapParser::builder(crawler.clone())
//!         .on_data(|records, context| println!("{} -> {}", context.url, records.len()))
//!         .build(),
//! );
//! crawler.attach(&parser)?;
//!
//! crawler.run("https://example.com/sitemap.xml").await?;
//! println!("{} records in total", parser.cumulative().len());
//! # Ok(())
//! # }
//! ```

use crate::config::FetchSettings;
use crate::host::{CrawlCallback, CrawlHost, CrawlRequest, ResponseContext, ResponseProcessor};
use crate::{Error, Result};
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, redirect};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::instrument;
use url::Url;

struct Inner {
    client: Client,
    runtime: Handle,
    processor: OnceLock<Weak<dyn ResponseProcessor>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    fetched: AtomicUsize,
}

/// HTTP crawl host that streams response bodies into a processor.
#[derive(Clone)]
pub struct HttpCrawler {
    inner: Arc<Inner>,
}

impl HttpCrawler {
    /// Build a crawler on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when called outside a tokio runtime and
    /// [`Error::Network`] if the HTTP client cannot be built.
    pub fn new(settings: &FetchSettings) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| Error::Config(format!("HttpCrawler requires a tokio runtime: {e}")))?;

        let client = Client::builder()
            .timeout(settings.timeout())
            .user_agent(settings.user_agent.as_str())
            .redirect(redirect::Policy::limited(settings.max_redirects))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(Error::Network)?;

        Ok(Self {
            inner: Arc::new(Inner {
                client,
                runtime,
                processor: OnceLock::new(),
                tasks: Mutex::new(Vec::new()),
                fetched: AtomicUsize::new(0),
            }),
        })
    }

    /// Connect the processor that receives every response.
    ///
    /// Only a weak link is kept, so a parser holding this crawler as its host
    /// does not form a cycle. Responses arriving after the processor is
    /// dropped pass through unread.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a processor is already attached.
    pub fn attach<P: ResponseProcessor + 'static>(&self, processor: &Arc<P>) -> Result<()> {
        let weak = Arc::downgrade(processor);
        let weak: Weak<dyn ResponseProcessor> = weak;
        self.inner
            .processor
            .set(weak)
            .map_err(|_| Error::Config("A response processor is already attached".to_string()))
    }

    /// Issue the initial, unmarked fetch. Failures are logged.
    pub fn start(&self, url: impl Into<String>) {
        self.crawl(
            CrawlRequest::new(url),
            Box::new(|outcome| {
                if let Err(e) = outcome {
                    tracing::error!(category = e.category(), error = %e, "Initial fetch failed");
                }
            }),
        );
    }

    /// Fetch `url`, wait for all follow-up fetches, and return the outcome of
    /// the initial fetch.
    pub async fn run(&self, url: impl Into<String>) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.crawl(
            CrawlRequest::new(url),
            Box::new(move |outcome| {
                let _ = tx.send(outcome);
            }),
        );

        self.wait_idle().await?;
        rx.await
            .map_err(|_| Error::Other("Initial fetch ended without an outcome".to_string()))?
    }

    /// Wait until every spawned fetch has finished, including fetches spawned
    /// while waiting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Other`] if a fetch task panicked or was cancelled.
    pub async fn wait_idle(&self) -> Result<()> {
        loop {
            let pending = std::mem::take(
                &mut *self
                    .inner
                    .tasks
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner),
            );
            if pending.is_empty() {
                return Ok(());
            }

            tracing::debug!(tasks = pending.len(), "Waiting for fetches");
            for handle in pending {
                handle
                    .await
                    .map_err(|e| Error::Other(format!("Fetch task failed: {e}")))?;
            }
        }
    }

    /// Number of fetches started so far.
    #[must_use]
    pub fn fetched_count(&self) -> usize {
        self.inner.fetched.load(Ordering::Relaxed)
    }
}

impl CrawlHost for HttpCrawler {
    fn crawl(&self, request: CrawlRequest, callback: CrawlCallback) {
        if let Err(e) = validate_url(&request.url) {
            tracing::debug!(url = %request.url, error = %e, "Rejected crawl request");
            callback(Err(e));
            return;
        }

        self.inner.fetched.fetch_add(1, Ordering::Relaxed);
        let inner = Arc::clone(&self.inner);
        let handle = self.inner.runtime.spawn(async move {
            let outcome = fetch(&inner, request).await;
            callback(outcome);
        });

        let mut tasks = self.inner.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }
}

impl std::fmt::Debug for HttpCrawler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCrawler")
            .field("fetched", &self.fetched_count())
            .field("attached", &self.inner.processor.get().is_some())
            .finish_non_exhaustive()
    }
}

fn validate_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url)?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(Error::InvalidUrl(format!("Unsupported scheme '{scheme}' in {url}"))),
    }
}

fn map_request_error(url: &str, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout(format!("{url}: {err}"))
    } else {
        Error::Network(err)
    }
}

#[instrument(level = "debug", skip(inner), fields(url = %request.url, marked = request.parameters.sitemap))]
async fn fetch(inner: &Inner, request: CrawlRequest) -> Result<()> {
    let url = validate_url(&request.url)?;
    let response = inner
        .client
        .get(url)
        .send()
        .await
        .map_err(|e| map_request_error(&request.url, e))?;

    let context = ResponseContext {
        url: response.url().to_string(),
        status: response.status().as_u16(),
        content_type: response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        marked: request.parameters.sitemap,
    };
    tracing::debug!(status = context.status, content_type = ?context.content_type, "Response received");

    let handler = inner
        .processor
        .get()
        .and_then(Weak::upgrade)
        .and_then(|processor| processor.begin(&context));
    let Some(mut handler) = handler else {
        tracing::debug!("Response passed through");
        return Ok(());
    };

    let mut body = response.bytes_stream();
    let mut bytes = 0usize;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| map_request_error(&request.url, e))?;
        bytes += chunk.len();
        handler.handle_chunk(&chunk);
    }
    handler.handle_end();

    tracing::debug!(bytes, "Response body drained");
    Ok(())
}
