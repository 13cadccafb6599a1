//! Document type detection from the opening bytes of a response body.
//!
//! The root element of a sitemap sits near the top of the document, so the
//! first delivered chunk is enough to tell a `<sitemapindex>` from a
//! `<urlset>`. Nothing past the first chunk is ever inspected: when the
//! signature tag is not in it, the stream is treated as "not a sitemap".

use memchr::memmem;
use serde::Serialize;

/// Marker identifying a sitemap index document.
pub const INDEX_MARKER: &[u8] = b"<sitemapindex";

/// Marker identifying a leaf sitemap document.
pub const URLSET_MARKER: &[u8] = b"<urlset";

/// Document type tag carried by every in-flight stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// No chunk has been sniffed yet.
    #[default]
    Unset,
    /// A `<sitemapindex>` listing other sitemap documents.
    Index,
    /// A `<urlset>` listing pages.
    Map,
    /// Sniffed, but neither marker was present.
    Other,
}

impl DocumentKind {
    /// Whether this stream produces records and an `on_data` delivery.
    #[must_use]
    pub const fn is_sitemap(self) -> bool {
        matches!(self, Self::Index | Self::Map)
    }

    /// Opening tag of one record, e.g. `<url`.
    #[must_use]
    pub const fn record_start(self) -> Option<&'static [u8]> {
        match self {
            Self::Index => Some(b"<sitemap"),
            Self::Map => Some(b"<url"),
            Self::Unset | Self::Other => None,
        }
    }

    /// Closing tag of one record, e.g. `</url>`.
    #[must_use]
    pub const fn record_end(self) -> Option<&'static [u8]> {
        match self {
            Self::Index => Some(b"</sitemap>"),
            Self::Map => Some(b"</url>"),
            Self::Unset | Self::Other => None,
        }
    }

    /// Element name of one record.
    #[must_use]
    pub const fn record_tag(self) -> Option<&'static [u8]> {
        match self {
            Self::Index => Some(b"sitemap"),
            Self::Map => Some(b"url"),
            Self::Unset | Self::Other => None,
        }
    }

    /// Synthetic root element a closed segment is wrapped in before parsing.
    #[must_use]
    pub const fn root_tag(self) -> Option<&'static str> {
        match self {
            Self::Index => Some("sitemapindex"),
            Self::Map => Some("urlset"),
            Self::Unset | Self::Other => None,
        }
    }
}

/// Decide the document type from a chunk.
///
/// Tests for `<sitemapindex` first, then `<urlset`; the first match wins.
/// Returns [`DocumentKind::Unset`] when neither marker occurs.
///
/// ```
/// use sitemill_core::sniff::{DocumentKind, sniff};
///
/// assert_eq!(sniff(b"<?xml version=\"1.0\"?><urlset>"), DocumentKind::Map);
/// assert_eq!(sniff(b"<sitemapindex><sitemap>"), DocumentKind::Index);
/// assert_eq!(sniff(b"<rss>"), DocumentKind::Unset);
/// ```
#[must_use]
pub fn sniff(chunk: &[u8]) -> DocumentKind {
    if memmem::find(chunk, INDEX_MARKER).is_some() {
        DocumentKind::Index
    } else if memmem::find(chunk, URLSET_MARKER).is_some() {
        DocumentKind::Map
    } else {
        DocumentKind::Unset
    }
}
