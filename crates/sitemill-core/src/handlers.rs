//! `on_data` / `on_error` handlers injected into a parser.
//!
//! Both handlers are fixed when the parser is built. The defaults only log:
//! an undelivered result map is a `warn`, a failed follow-up fetch an
//! `error`. Neither default panics or propagates.

use crate::Error;
use crate::host::ResponseContext;
use crate::result_map::ResultMap;
use std::fmt;
use std::sync::Arc;

/// Called once per drained sitemap stream with its records.
pub type DataHandler = Arc<dyn Fn(ResultMap, &ResponseContext) + Send + Sync>;

/// Called when a fetch issued by index-following fails.
pub type ErrorHandler = Arc<dyn Fn(Error, &ResponseContext) + Send + Sync>;

/// The pair of handlers a parser reports through.
#[derive(Clone)]
pub struct Handlers {
    on_data: DataHandler,
    on_error: ErrorHandler,
}

impl Handlers {
    /// Replace the data handler.
    #[must_use]
    pub fn on_data<F>(mut self, handler: F) -> Self
    where
        F: Fn(ResultMap, &ResponseContext) + Send + Sync + 'static,
    {
        self.on_data = Arc::new(handler);
        self
    }

    /// Replace the error handler.
    #[must_use]
    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(Error, &ResponseContext) + Send + Sync + 'static,
    {
        self.on_error = Arc::new(handler);
        self
    }

    pub(crate) fn emit_data(&self, records: ResultMap, context: &ResponseContext) {
        (self.on_data)(records, context);
    }

    pub(crate) fn emit_error(&self, error: Error, context: &ResponseContext) {
        (self.on_error)(error, context);
    }
}

impl Default for Handlers {
    fn default() -> Self {
        Self {
            on_data: Arc::new(log_unhandled_data),
            on_error: Arc::new(log_error),
        }
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers").finish_non_exhaustive()
    }
}

fn log_unhandled_data(records: ResultMap, context: &ResponseContext) {
    tracing::warn!(
        url = %context.url,
        records = records.len(),
        "Sitemap data is not handled"
    );
}

fn log_error(error: Error, context: &ResponseContext) {
    tracing::error!(
        url = %context.url,
        category = error.category(),
        error = %error,
        "Sitemap fetch failed"
    );
}
