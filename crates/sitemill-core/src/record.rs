//! Sitemap records and the coercion of their field text.
//!
//! A record is one `<url>` or `<sitemap>` entry. Every optional field is
//! looked up independently and degrades to `None` when it is missing or its
//! text cannot be interpreted; only an empty `loc` disqualifies a record.

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single entry from a sitemap or sitemap index.
///
/// Records are read-only once built. Serializes as
/// `{loc, lastmod, changefreq, priority}` with `null` for absent fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapRecord {
    loc: String,
    lastmod: Option<DateTime<Utc>>,
    changefreq: Option<ChangeFrequency>,
    priority: Option<f64>,
}

impl SitemapRecord {
    /// Create a record with only a location.
    pub fn new(loc: impl Into<String>) -> Self {
        Self {
            loc: loc.into(),
            lastmod: None,
            changefreq: None,
            priority: None,
        }
    }

    /// Set the last modification date.
    #[must_use]
    pub const fn with_lastmod(mut self, lastmod: DateTime<Utc>) -> Self {
        self.lastmod = Some(lastmod);
        self
    }

    /// Set the change frequency.
    #[must_use]
    pub const fn with_changefreq(mut self, changefreq: ChangeFrequency) -> Self {
        self.changefreq = Some(changefreq);
        self
    }

    /// Set the priority, clamped to the 0.0-1.0 range. Non-finite values
    /// leave it absent.
    #[must_use]
    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority.is_finite().then(|| priority.clamp(0.0, 1.0));
        self
    }

    /// Absolute URL of the page (or of the child sitemap, for index entries).
    #[must_use]
    pub fn loc(&self) -> &str {
        &self.loc
    }

    /// Last modification date.
    #[must_use]
    pub const fn lastmod(&self) -> Option<DateTime<Utc>> {
        self.lastmod
    }

    /// How frequently the page changes.
    #[must_use]
    pub const fn changefreq(&self) -> Option<ChangeFrequency> {
        self.changefreq
    }

    /// Priority of this URL relative to others (0.0 to 1.0).
    #[must_use]
    pub const fn priority(&self) -> Option<f64> {
        self.priority
    }

    /// Whether the record may be stored in a result map.
    #[must_use]
    pub fn has_loc(&self) -> bool {
        !self.loc.is_empty()
    }
}

/// Change frequency hints from sitemap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    /// The page changes every time it is accessed.
    Always,
    /// The page changes hourly.
    Hourly,
    /// The page changes daily.
    Daily,
    /// The page changes weekly.
    Weekly,
    /// The page changes monthly.
    Monthly,
    /// The page changes yearly.
    Yearly,
    /// The page is archived and will not change.
    Never,
}

impl ChangeFrequency {
    /// Lowercase protocol spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Never => "never",
        }
    }
}

impl std::fmt::Display for ChangeFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChangeFrequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "never" => Ok(Self::Never),
            _ => Err(Error::Parse(format!("Invalid changefreq value: {s}"))),
        }
    }
}

/// Raw text collected for one record before coercion.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RawFields {
    /// Text of the `loc` element(s).
    pub loc: String,
    /// Text of the `lastmod` element(s).
    pub lastmod: String,
    /// Text of the `changefreq` element(s).
    pub changefreq: String,
    /// Text of the `priority` element(s).
    pub priority: String,
}

impl RawFields {
    /// Coerce the collected text into a record.
    ///
    /// Never fails: every optional field that is empty or unparseable comes
    /// back as `None`.
    #[must_use]
    pub fn into_record(self) -> SitemapRecord {
        let changefreq = non_empty(&self.changefreq).and_then(|text| match text.parse() {
            Ok(freq) => Some(freq),
            Err(_) => {
                tracing::debug!(changefreq = %text, "Ignoring unknown changefreq");
                None
            },
        });

        SitemapRecord {
            loc: self.loc.trim().to_string(),
            lastmod: non_empty(&self.lastmod).and_then(parse_lastmod),
            changefreq,
            priority: non_empty(&self.priority).and_then(parse_priority),
        }
    }
}

fn non_empty(text: &str) -> Option<&str> {
    let text = text.trim();
    (!text.is_empty()).then_some(text)
}

/// Parse a lastmod date string into a `DateTime<Utc>`.
///
/// Supports:
/// - `2024-01-15` (date only, midnight UTC)
/// - `2024-01-15T10:30:00Z` and `2024-01-15T10:30:00+02:00` (RFC 3339)
/// - `2024-01-15T10:30:00.000Z` (fractional seconds)
/// - `2024-01-15T10:30+02:00` (W3C datetime without seconds)
/// - `2024-01-15T10:30:00` and `2024-01-15T10:30` (no offset, assumed UTC)
pub fn parse_lastmod(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }

    for format in ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M:%S%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.and_utc());
        }
    }

    tracing::debug!(date_str = %s, "Could not parse lastmod date");
    None
}

/// Parse a priority value, clamping to the 0.0-1.0 range.
///
/// Non-numeric and non-finite text yields `None`, never zero.
pub fn parse_priority(s: &str) -> Option<f64> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
        .map(|p| p.clamp(0.0, 1.0))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_date_only_lastmod() {
        let lastmod = parse_lastmod("2006-01-07").unwrap();
        assert_eq!(lastmod.year(), 2006);
        // zero-based month index: January
        assert_eq!(lastmod.month0(), 0);
        assert_eq!(lastmod.day(), 7);
    }

    #[test]
    fn test_lastmod_with_offset() {
        let lastmod = parse_lastmod("2014-10-15T18:23:17+00:00").unwrap();
        assert_eq!(lastmod.year(), 2014);
        assert_eq!(lastmod.month0(), 9);
        assert_eq!(lastmod.day(), 15);
        assert_eq!(lastmod.hour(), 18);
    }

    #[test]
    fn test_lastmod_offset_is_normalized_to_utc() {
        let lastmod = parse_lastmod("2024-01-15T01:30:00+02:00").unwrap();
        assert_eq!(lastmod.day(), 14);
        assert_eq!(lastmod.hour(), 23);
    }

    #[test]
    fn test_lastmod_variants() {
        for text in [
            "2024-01-15T10:30:00Z",
            "2024-01-15T10:30:00.123Z",
            "2024-01-15T10:30+01:00",
            "2024-01-15T10:30:00",
            "2024-01-15T10:30",
            "  2024-01-15  ",
        ] {
            assert!(parse_lastmod(text).is_some(), "failed to parse {text}");
        }
    }

    #[test]
    fn test_unparseable_lastmod_is_absent() {
        assert_eq!(parse_lastmod("yesterday"), None);
        assert_eq!(parse_lastmod("2024-13-45"), None);
        assert_eq!(parse_lastmod(""), None);
    }

    #[test]
    fn test_priority_parsing() {
        assert_eq!(parse_priority("0.8"), Some(0.8));
        assert_eq!(parse_priority("1.0"), Some(1.0));
        assert_eq!(parse_priority("0.0"), Some(0.0));
        assert_eq!(parse_priority(" 0.5 "), Some(0.5));

        assert_eq!(parse_priority("1.5"), Some(1.0));
        assert_eq!(parse_priority("-0.5"), Some(0.0));

        assert_eq!(parse_priority("high"), None);
        assert_eq!(parse_priority(""), None);
        assert_eq!(parse_priority("NaN"), None);
        assert_eq!(parse_priority("inf"), None);
    }

    #[test]
    fn test_changefreq_parsing() {
        let cases = [
            ("always", ChangeFrequency::Always),
            ("hourly", ChangeFrequency::Hourly),
            ("daily", ChangeFrequency::Daily),
            ("weekly", ChangeFrequency::Weekly),
            ("monthly", ChangeFrequency::Monthly),
            ("yearly", ChangeFrequency::Yearly),
            ("never", ChangeFrequency::Never),
            ("WEEKLY", ChangeFrequency::Weekly),
            (" Daily ", ChangeFrequency::Daily),
        ];

        for (value, expected) in cases {
            let parsed: ChangeFrequency = value.parse().unwrap();
            assert_eq!(parsed, expected);
            assert_eq!(expected.to_string(), expected.as_str());
        }
        assert!("sometimes".parse::<ChangeFrequency>().is_err());
    }

    #[test]
    fn test_raw_fields_coercion() {
        let record = RawFields {
            loc: "  http://example.com/  ".to_string(),
            lastmod: "2006-01-07".to_string(),
            changefreq: "daily".to_string(),
            priority: "0.8".to_string(),
        }
        .into_record();

        assert_eq!(record.loc(), "http://example.com/");
        assert!(record.lastmod().is_some());
        assert_eq!(record.changefreq(), Some(ChangeFrequency::Daily));
        assert_eq!(record.priority(), Some(0.8));
        assert!(record.has_loc());
    }

    #[test]
    fn test_raw_fields_degrade_to_absent() {
        let record = RawFields {
            loc: String::new(),
            lastmod: "not a date".to_string(),
            changefreq: "fortnightly".to_string(),
            priority: "high".to_string(),
        }
        .into_record();

        assert!(!record.has_loc());
        assert_eq!(record.lastmod(), None);
        assert_eq!(record.changefreq(), None);
        assert_eq!(record.priority(), None);
    }

    #[test]
    fn test_serialization_shape() {
        let record = SitemapRecord::new("https://example.com/page1")
            .with_changefreq(ChangeFrequency::Weekly)
            .with_priority(0.8);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["loc"], "https://example.com/page1");
        assert_eq!(json["changefreq"], "weekly");
        assert_eq!(json["priority"], 0.8);
        assert!(json["lastmod"].is_null());

        let parsed: SitemapRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_builders_leave_original_untouched() {
        let lastmod = parse_lastmod("2024-01-15").unwrap();
        let base = SitemapRecord::new("https://example.com/");
        let built = base
            .clone()
            .with_lastmod(lastmod)
            .with_changefreq(ChangeFrequency::Monthly)
            .with_priority(1.7);

        assert_eq!(base.lastmod(), None);
        assert_eq!(base.priority(), None);
        assert_eq!(built.loc(), "https://example.com/");
        assert_eq!(built.lastmod(), Some(lastmod));
        assert_eq!(built.changefreq(), Some(ChangeFrequency::Monthly));
        assert_eq!(built.priority(), Some(1.0));
        assert_eq!(built.with_priority(f64::NAN).priority(), None);
    }
}
