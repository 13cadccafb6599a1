//! Incremental record extraction across chunk boundaries.
//!
//! Each response stream owns a [`StreamState`]. Chunks are appended to a
//! pending buffer; everything up to the last record end marker is parsed and
//! dropped from the buffer, and the tail (a record still arriving) waits for
//! the next chunk. After every pass the buffer holds no complete record.
//!
//! ```
//! use sitemill_core::extract::StreamState;
//! use sitemill_core::sniff::DocumentKind;
//!
//! let mut state = StreamState::new();
//! state.push_chunk(b"<urlset><url><loc>https://example.com/a</lo");
//! assert_eq!(state.kind(), DocumentKind::Map);
//! assert!(state.records().is_empty());
//!
//! let stored = state.push_chunk(b"c></url></urlset>");
//! assert_eq!(stored.len(), 1);
//! assert!(state.records().contains("https://example.com/a"));
//! ```

use crate::fragment::parse_fragment;
use crate::record::SitemapRecord;
use crate::result_map::ResultMap;
use crate::sniff::{DocumentKind, sniff};
use memchr::memmem;

/// Per-response extraction state.
#[derive(Debug, Default)]
pub struct StreamState {
    kind: DocumentKind,
    pending: Vec<u8>,
    records: ResultMap,
}

impl StreamState {
    /// Create state for a response whose body has not started yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Document type decided from the first chunk.
    #[must_use]
    pub const fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Bytes received but not yet consumed into a record.
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Records stored for this stream so far.
    #[must_use]
    pub const fn records(&self) -> &ResultMap {
        &self.records
    }

    /// Feed the next chunk of the body.
    ///
    /// The first call sniffs the document type; a chunk without either root
    /// marker turns the stream into [`DocumentKind::Other`] for good, after
    /// which chunks are consumed without buffering. Returns the records this
    /// chunk completed that had a non-empty `loc`, in document order.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<SitemapRecord> {
        if self.kind == DocumentKind::Unset {
            self.kind = match sniff(chunk) {
                DocumentKind::Unset => DocumentKind::Other,
                kind => kind,
            };
            tracing::debug!(kind = ?self.kind, "Sniffed document type");
        }

        let (Some(start), Some(end)) = (self.kind.record_start(), self.kind.record_end()) else {
            return Vec::new();
        };

        self.pending.extend_from_slice(chunk);

        let Some(last) = memmem::rfind(&self.pending, end) else {
            return Vec::new();
        };

        let tail = self.pending.split_off(last + end.len());
        let closed = std::mem::replace(&mut self.pending, tail);
        let first = memmem::find(&closed, start).unwrap_or(0);

        let mut stored = Vec::new();
        for record in parse_fragment(&closed[first..], self.kind) {
            if !record.has_loc() {
                tracing::debug!("Dropping sitemap record without loc");
                continue;
            }
            stored.push(record.clone());
            self.records.insert(record);
        }

        tracing::debug!(
            closed_bytes = closed.len(),
            pending_bytes = self.pending.len(),
            records = stored.len(),
            "Extracted sitemap records"
        );
        stored
    }

    /// End the stream, yielding its records if it was a sitemap.
    ///
    /// Returns `None` for streams sniffed as anything but an index or urlset,
    /// including streams that never received a chunk.
    #[must_use]
    pub fn finish(self) -> Option<ResultMap> {
        if !self.pending.is_empty() {
            tracing::debug!(
                pending_bytes = self.pending.len(),
                "Discarding unterminated tail of sitemap stream"
            );
        }
        self.kind.is_sitemap().then_some(self.records)
    }
}
