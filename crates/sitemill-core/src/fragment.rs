//! Parsing of closed record segments into [`SitemapRecord`]s.
//!
//! The extractor hands over a byte range that ends with a complete record and
//! may begin with the document prolog or root element. The range is wrapped in
//! a synthetic root matching the document kind and read with `quick-xml`.
//! Reading is best effort: end-name checks are off, and a reader error ends the
//! pass while keeping every record completed before it.

use crate::record::{RawFields, SitemapRecord};
use crate::sniff::DocumentKind;
use quick_xml::Reader;
use quick_xml::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Loc,
    Lastmod,
    Changefreq,
    Priority,
}

impl Field {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"loc" => Some(Self::Loc),
            b"lastmod" => Some(Self::Lastmod),
            b"changefreq" => Some(Self::Changefreq),
            b"priority" => Some(Self::Priority),
            _ => None,
        }
    }

    fn slot(self, raw: &mut RawFields) -> &mut String {
        match self {
            Self::Loc => &mut raw.loc,
            Self::Lastmod => &mut raw.lastmod,
            Self::Changefreq => &mut raw.changefreq,
            Self::Priority => &mut raw.priority,
        }
    }
}

/// Parse every complete record element in `segment`.
///
/// Records with an empty `loc` are returned too; callers decide whether to
/// store them. Returns nothing for kinds that carry no records.
///
/// ```
/// use sitemill_core::fragment::parse_fragment;
/// use sitemill_core::sniff::DocumentKind;
///
/// let segment = b"<url><loc>https://example.com/</loc><priority>0.8</priority></url>";
/// let records = parse_fragment(segment, DocumentKind::Map);
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].loc(), "https://example.com/");
/// assert_eq!(records[0].priority(), Some(0.8));
/// ```
pub fn parse_fragment(segment: &[u8], kind: DocumentKind) -> Vec<SitemapRecord> {
    let (Some(root), Some(record_tag)) = (kind.root_tag(), kind.record_tag()) else {
        return Vec::new();
    };

    let mut wrapped = Vec::with_capacity(segment.len() + 2 * root.len() + 5);
    wrapped.push(b'<');
    wrapped.extend_from_slice(root.as_bytes());
    wrapped.push(b'>');
    wrapped.extend_from_slice(segment);
    wrapped.extend_from_slice(b"</");
    wrapped.extend_from_slice(root.as_bytes());
    wrapped.push(b'>');

    let mut reader = Reader::from_reader(wrapped.as_slice());
    reader.config_mut().trim_text(true);
    reader.config_mut().check_end_names = false;

    let mut records = Vec::new();
    let mut buf = Vec::new();
    let mut current: Option<RawFields> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.name();
                if name.as_ref() == record_tag {
                    current = Some(RawFields::default());
                    field = None;
                } else if current.is_some() {
                    if let Some(found) = Field::from_name(name.as_ref()) {
                        field = Some(found);
                    }
                }
            },
            Ok(Event::End(e)) => {
                let name = e.name();
                if name.as_ref() == record_tag {
                    if let Some(raw) = current.take() {
                        records.push(raw.into_record());
                    }
                    field = None;
                } else if field.is_some() && Field::from_name(name.as_ref()) == field {
                    field = None;
                }
            },
            Ok(Event::Text(e)) => {
                if let (Some(raw), Some(field)) = (current.as_mut(), field) {
                    match e.unescape() {
                        Ok(text) => field.slot(raw).push_str(&text),
                        Err(_) => field.slot(raw).push_str(&String::from_utf8_lossy(&e)),
                    }
                }
            },
            Ok(Event::CData(e)) => {
                if let (Some(raw), Some(field)) = (current.as_mut(), field) {
                    field.slot(raw).push_str(&String::from_utf8_lossy(&e));
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!(
                    error = %e,
                    position = reader.buffer_position(),
                    "Stopping at malformed sitemap fragment"
                );
                break;
            },
            _ => {},
        }
        buf.clear();
    }

    records
}
