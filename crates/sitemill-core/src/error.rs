//! Error types for sitemill-core operations.
//!
//! Malformed sitemap XML is never reported through this type: the extractor
//! degrades to absent fields or skips the document instead. Errors arise from
//! configuration (bad filter patterns, unreadable settings files) and from the
//! fetch layer that index-following drives.
//!
//! ## Error Categories
//!
//! - **I/O Errors**: settings files, disk access
//! - **Network Errors**: HTTP requests, body streams
//! - **Parse Errors**: values that could not be interpreted
//! - **Configuration Errors**: invalid settings or filter patterns
//! - **URL Errors**: malformed fetch targets
//!
//! ```rust
//! use sitemill_core::Error;
//!
//! let err = Error::Timeout("child sitemap".to_string());
//! assert!(err.is_recoverable());
//! assert_eq!(err.category(), "timeout");
//! ```

use thiserror::Error;

/// The main error type for sitemill-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Network operation failed.
    ///
    /// Covers sending requests and reading response bodies. The underlying
    /// `reqwest::Error` is preserved so connection details stay inspectable.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A value could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration is invalid or inaccessible.
    ///
    /// ## Common Causes
    ///
    /// - Invalid TOML syntax in a settings file
    /// - A filter pattern that is not a valid regular expression
    /// - Building the HTTP client outside of a tokio runtime
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL is malformed or uses an unsupported scheme.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Operation timed out.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Generic error for uncategorized failures.
    #[error("{0}")]
    Other(String),
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Self::Config(format!("Invalid filter pattern: {err}"))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl Error {
    /// Check if the error might be recoverable through retry logic.
    ///
    /// Returns `true` for timeouts, connection failures and interrupted I/O.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Get the error category as a stable string identifier, for logging.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Network(_) => "network",
            Self::Parse(_) => "parse",
            Self::Config(_) => "config",
            Self::InvalidUrl(_) => "invalid_url",
            Self::Timeout(_) => "timeout",
            Self::Other(_) => "other",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
