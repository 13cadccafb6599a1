//! Record accumulation keyed by `loc`.
//!
//! Two maps exist while a crawl runs: a [`ResultMap`] per response stream,
//! handed to `on_data` when the stream ends, and one [`CumulativeMap`] per
//! parser that collects every record from every stream and is never cleared.
//! In both, the last record seen for a `loc` wins.

use crate::record::SitemapRecord;
use serde::Serialize;
use std::collections::HashMap;
use std::collections::hash_map;
use std::sync::{PoisonError, RwLock};

/// Records of one response stream, keyed by `loc`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultMap {
    records: HashMap<String, SitemapRecord>,
}

impl ResultMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any earlier one with the same `loc`.
    ///
    /// Records with an empty `loc` are rejected; returns whether the record
    /// was stored.
    pub fn insert(&mut self, record: SitemapRecord) -> bool {
        if !record.has_loc() {
            return false;
        }
        self.records.insert(record.loc().to_string(), record);
        true
    }

    /// Look up a record by location.
    #[must_use]
    pub fn get(&self, loc: &str) -> Option<&SitemapRecord> {
        self.records.get(loc)
    }

    /// Whether a record with this location is present.
    #[must_use]
    pub fn contains(&self, loc: &str) -> bool {
        self.records.contains_key(loc)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the map holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over `(loc, record)` pairs in arbitrary order.
    pub fn iter(&self) -> hash_map::Iter<'_, String, SitemapRecord> {
        self.records.iter()
    }

    /// Iterate over the records in arbitrary order.
    pub fn records(&self) -> hash_map::Values<'_, String, SitemapRecord> {
        self.records.values()
    }

    /// Records sorted by `loc`, for stable output.
    #[must_use]
    pub fn sorted(&self) -> Vec<&SitemapRecord> {
        let mut records: Vec<_> = self.records.values().collect();
        records.sort_by(|a, b| a.loc().cmp(b.loc()));
        records
    }
}

impl IntoIterator for ResultMap {
    type Item = (String, SitemapRecord);
    type IntoIter = hash_map::IntoIter<String, SitemapRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultMap {
    type Item = (&'a String, &'a SitemapRecord);
    type IntoIter = hash_map::Iter<'a, String, SitemapRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl FromIterator<SitemapRecord> for ResultMap {
    fn from_iter<T: IntoIterator<Item = SitemapRecord>>(iter: T) -> Self {
        let mut map = Self::new();
        for record in iter {
            map.insert(record);
        }
        map
    }
}

/// Parser-wide record map shared by every stream.
///
/// Inserts from concurrent streams are safe; each stream only adds records it
/// discovered itself, so last-write-wins per key is the whole contract.
#[derive(Debug, Default)]
pub struct CumulativeMap {
    inner: RwLock<ResultMap>,
}

impl CumulativeMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record; see [`ResultMap::insert`].
    pub fn insert(&self, record: SitemapRecord) -> bool {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(record)
    }

    /// Clone the record stored for `loc`.
    #[must_use]
    pub fn get(&self, loc: &str) -> Option<SitemapRecord> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(loc)
            .cloned()
    }

    /// Whether a record with this location has been seen.
    #[must_use]
    pub fn contains(&self, loc: &str) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(loc)
    }

    /// Number of distinct locations seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no record has been seen yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current contents.
    #[must_use]
    pub fn snapshot(&self) -> ResultMap {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
