//! Parser options, response filters and the TOML settings file.
//!
//! [`ParserOptions`] is what a [`SitemapParser`](crate::SitemapParser) runs
//! with: whether to follow index entries, whether to only process responses
//! marked as sitemap fetches, and three filters that gate every response
//! before any sniffing happens. [`ParserSettings`] is its serializable form,
//! with filters written as regular expressions, plus the [`FetchSettings`]
//! used by [`HttpCrawler`](crate::HttpCrawler).
//!
//! ## Example settings file
//!
//! ```toml
//! follow = true
//! only_marked = false
//! filter_content_type = "^(text|application)/([a-zA-Z0-9\\-_]*\\+)?xml"
//! filter_url = "^https://example\\.com/"
//!
//! [fetch]
//! timeout_secs = 30
//! max_redirects = 5
//! ```
//!
//! ```rust
//! use sitemill_core::ParserSettings;
//!
//! let settings = ParserSettings::from_toml_str("follow = false\n")?;
//! let options = settings.to_options()?;
//! assert!(!options.follow);
//! assert!(options.filter_status_code.test("200"));
//! # Ok::<(), sitemill_core::Error>(())
//! ```

use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

/// Default content-type pattern: XML served as `text/*` or `application/*`,
/// including `+xml` suffixed types such as `application/rss+xml`.
pub const DEFAULT_CONTENT_TYPE_PATTERN: &str = r"^(text|application)/([a-zA-Z0-9\-_]*\+)?xml";

/// Default status pattern: any 2xx response.
pub const DEFAULT_STATUS_CODE_PATTERN: &str = "^2";

/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static DEFAULT_CONTENT_TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_CONTENT_TYPE_PATTERN).unwrap());

/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static DEFAULT_STATUS_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_STATUS_CODE_PATTERN).unwrap());

/// A `test(value) -> bool` capability applied to one response attribute.
pub trait ValueFilter: Send + Sync {
    /// Whether the value passes the filter.
    fn test(&self, value: &str) -> bool;
}

impl ValueFilter for Regex {
    fn test(&self, value: &str) -> bool {
        self.is_match(value)
    }
}

/// Filter that accepts every value.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl ValueFilter for AcceptAll {
    fn test(&self, _value: &str) -> bool {
        true
    }
}

/// Filter backed by a closure.
///
/// ```rust
/// use sitemill_core::config::{PredicateFilter, ValueFilter};
///
/// let https_only = PredicateFilter(|url: &str| url.starts_with("https://"));
/// assert!(https_only.test("https://example.com/sitemap.xml"));
/// assert!(!https_only.test("http://example.com/sitemap.xml"));
/// ```
#[derive(Clone, Copy)]
pub struct PredicateFilter<F>(pub F);

impl<F> ValueFilter for PredicateFilter<F>
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn test(&self, value: &str) -> bool {
        (self.0)(value)
    }
}

/// Runtime options for a sitemap parser.
#[derive(Clone)]
pub struct ParserOptions {
    /// Issue a fetch for every entry of a sitemap index.
    pub follow: bool,
    /// Only process responses whose request was marked as a sitemap fetch.
    pub only_marked: bool,
    /// Tested against the `content-type` header (empty when missing).
    pub filter_content_type: Arc<dyn ValueFilter>,
    /// Tested against the decimal status code.
    pub filter_status_code: Arc<dyn ValueFilter>,
    /// Tested against the response URL.
    pub filter_url: Arc<dyn ValueFilter>,
}

impl ParserOptions {
    /// Set whether index entries are followed.
    #[must_use]
    pub const fn with_follow(mut self, follow: bool) -> Self {
        self.follow = follow;
        self
    }

    /// Set whether only marked responses are processed.
    #[must_use]
    pub const fn with_only_marked(mut self, only_marked: bool) -> Self {
        self.only_marked = only_marked;
        self
    }

    /// Replace the content-type filter.
    #[must_use]
    pub fn with_content_type_filter(mut self, filter: impl ValueFilter + 'static) -> Self {
        self.filter_content_type = Arc::new(filter);
        self
    }

    /// Replace the status code filter.
    #[must_use]
    pub fn with_status_code_filter(mut self, filter: impl ValueFilter + 'static) -> Self {
        self.filter_status_code = Arc::new(filter);
        self
    }

    /// Replace the URL filter.
    #[must_use]
    pub fn with_url_filter(mut self, filter: impl ValueFilter + 'static) -> Self {
        self.filter_url = Arc::new(filter);
        self
    }
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            follow: true,
            only_marked: false,
            filter_content_type: Arc::new(DEFAULT_CONTENT_TYPE_RE.clone()),
            filter_status_code: Arc::new(DEFAULT_STATUS_CODE_RE.clone()),
            filter_url: Arc::new(AcceptAll),
        }
    }
}

impl fmt::Debug for ParserOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserOptions")
            .field("follow", &self.follow)
            .field("only_marked", &self.only_marked)
            .finish_non_exhaustive()
    }
}

/// HTTP settings for [`HttpCrawler`](crate::HttpCrawler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Maximum number of redirects followed per request.
    pub max_redirects: usize,
}

impl FetchSettings {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("sitemill/", env!("CARGO_PKG_VERSION")).to_string(),
            max_redirects: 5,
        }
    }
}

/// Serializable parser configuration.
///
/// Filters left unset fall back to the defaults of [`ParserOptions`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    /// Follow sitemap index entries.
    pub follow: bool,
    /// Process only responses marked as sitemap fetches.
    pub only_marked: bool,
    /// Regular expression for the `content-type` header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_content_type: Option<String>,
    /// Regular expression for the status code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_status_code: Option<String>,
    /// Regular expression for the response URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_url: Option<String>,
    /// HTTP settings.
    pub fetch: FetchSettings,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            follow: true,
            only_marked: false,
            filter_content_type: None,
            filter_status_code: None,
            filter_url: None,
            fetch: FetchSettings::default(),
        }
    }
}

impl ParserSettings {
    /// Load settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or is not valid
    /// settings TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read settings {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Failed to parse settings: {e}")))
    }

    /// Write settings to a TOML file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Config(format!("Failed to create settings directory: {e}"))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize settings: {e}")))?;

        fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write settings: {e}")))?;

        Ok(())
    }

    /// Compile the settings into parser options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a filter is not a valid regular expression.
    pub fn to_options(&self) -> Result<ParserOptions> {
        let mut options = ParserOptions::default()
            .with_follow(self.follow)
            .with_only_marked(self.only_marked);

        if let Some(pattern) = &self.filter_content_type {
            options = options.with_content_type_filter(Regex::new(pattern)?);
        }
        if let Some(pattern) = &self.filter_status_code {
            options = options.with_status_code_filter(Regex::new(pattern)?);
        }
        if let Some(pattern) = &self.filter_url {
            options = options.with_url_filter(Regex::new(pattern)?);
        }

        Ok(options)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_content_type_filter() {
        let options = ParserOptions::default();
        let filter = &options.filter_content_type;

        for accepted in [
            "application/xml",
            "text/xml",
            "text/xml; charset=utf-8",
            "application/rss+xml",
            "application/atom+xml",
        ] {
            assert!(filter.test(accepted), "should accept {accepted}");
        }

        for rejected in ["text/html", "application/json", "image/svg", ""] {
            assert!(!filter.test(rejected), "should reject {rejected}");
        }
    }

    #[test]
    fn test_default_status_and_url_filters() {
        let options = ParserOptions::default();
        assert!(options.filter_status_code.test("200"));
        assert!(options.filter_status_code.test("204"));
        assert!(!options.filter_status_code.test("404"));
        assert!(!options.filter_status_code.test("301"));
        assert!(options.filter_url.test("anything at all"));
        assert!(options.follow);
        assert!(!options.only_marked);
    }

    #[test]
    fn test_predicate_filter_override() {
        let options =
            ParserOptions::default().with_url_filter(PredicateFilter(|url: &str| url.ends_with(".xml")));
        assert!(options.filter_url.test("https://example.com/sitemap.xml"));
        assert!(!options.filter_url.test("https://example.com/"));
    }

    #[test]
    fn test_settings_defaults_from_empty_toml() {
        let settings = ParserSettings::from_toml_str("").unwrap();
        assert_eq!(settings, ParserSettings::default());
        assert_eq!(settings.fetch.timeout(), Duration::from_secs(30));
        assert!(settings.fetch.user_agent.starts_with("sitemill/"));
    }

    #[test]
    fn test_settings_to_options() {
        let settings = ParserSettings::from_toml_str(
            r#"
follow = false
only_marked = true
filter_status_code = "^(2|3)"
filter_url = "^https://example\\.com/"

[fetch]
timeout_secs = 5
"#,
        )
        .unwrap();

        assert_eq!(settings.fetch.timeout_secs, 5);
        assert_eq!(settings.fetch.max_redirects, 5);

        let options = settings.to_options().unwrap();
        assert!(!options.follow);
        assert!(options.only_marked);
        assert!(options.filter_status_code.test("302"));
        assert!(options.filter_url.test("https://example.com/sitemap.xml"));
        assert!(!options.filter_url.test("https://other.com/sitemap.xml"));
        // Unset filter keeps the default
        assert!(options.filter_content_type.test("application/xml"));
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let settings = ParserSettings {
            filter_url: Some("(unclosed".to_string()),
            ..ParserSettings::default()
        };
        let err = settings.to_options().unwrap_err();
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = ParserSettings::from_toml_str("follow = maybe").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("Failed to parse settings"));
    }

    #[test]
    fn test_settings_save_and_load_roundtrip() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("nested").join("sitemill.toml");

        let settings = ParserSettings {
            follow: false,
            filter_content_type: Some("xml".to_string()),
            fetch: FetchSettings {
                timeout_secs: 12,
                ..FetchSettings::default()
            },
            ..ParserSettings::default()
        };

        settings.save(&path)?;
        let loaded = ParserSettings::load(&path)?;
        assert_eq!(loaded, settings);
        Ok(())
    }

    #[test]
    fn test_load_missing_file() {
        let err = ParserSettings::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read settings"));
    }
}
