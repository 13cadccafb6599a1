//! Rendering of crawl results.
//!
//! Every sitemap stream the parser delivered becomes one [`Delivery`].
//! Deliveries and their records are printed sorted by URL so repeated runs
//! produce identical output even though fetches finish in any order.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use sitemill_core::{ResultMap, SitemapRecord};
use std::io::Write;

use crate::cli::OutputFormat;

/// Records delivered for one sitemap response.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// URL of the sitemap the records came from.
    pub url: String,
    /// Records of that sitemap, keyed by `loc`.
    pub records: ResultMap,
}

#[derive(Serialize)]
struct StreamOutput<'a> {
    url: &'a str,
    records: Vec<&'a SitemapRecord>,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    streams: Vec<StreamOutput<'a>>,
    cumulative: usize,
}

#[derive(Serialize)]
struct SourcedRecord<'a> {
    source: &'a str,
    #[serde(flatten)]
    record: &'a SitemapRecord,
}

/// Write `deliveries` in the chosen format.
pub fn render(
    format: OutputFormat,
    deliveries: &[Delivery],
    cumulative: usize,
    out: &mut impl Write,
) -> Result<()> {
    let mut sorted: Vec<&Delivery> = deliveries.iter().collect();
    sorted.sort_by(|a, b| a.url.cmp(&b.url));

    match format {
        OutputFormat::Text => render_text(&sorted, cumulative, out),
        OutputFormat::Json => {
            let output = JsonOutput {
                streams: sorted
                    .iter()
                    .map(|delivery| StreamOutput {
                        url: &delivery.url,
                        records: delivery.records.sorted(),
                    })
                    .collect(),
                cumulative,
            };
            serde_json::to_writer_pretty(&mut *out, &output)?;
            writeln!(out)?;
            Ok(())
        },
        OutputFormat::Jsonl => {
            for delivery in sorted {
                for record in delivery.records.sorted() {
                    let line = SourcedRecord {
                        source: &delivery.url,
                        record,
                    };
                    serde_json::to_writer(&mut *out, &line)?;
                    writeln!(out)?;
                }
            }
            Ok(())
        },
    }
}

fn render_text(deliveries: &[&Delivery], cumulative: usize, out: &mut impl Write) -> Result<()> {
    for delivery in deliveries {
        let count = delivery.records.len();
        let noun = if count == 1 { "record" } else { "records" };
        writeln!(out, "{} ({count} {noun})", delivery.url.bold())?;

        for record in delivery.records.sorted() {
            writeln!(out, "  {}", record_line(record))?;
        }
        writeln!(out)?;
    }

    let noun = if cumulative == 1 { "record" } else { "records" };
    writeln!(
        out,
        "{}",
        format!(
            "{cumulative} {noun} from {} sitemap(s)",
            deliveries.len()
        )
        .dimmed()
    )?;
    Ok(())
}

fn record_line(record: &SitemapRecord) -> String {
    let lastmod = record
        .lastmod()
        .map_or_else(|| "-".to_string(), |date| date.to_rfc3339());
    let changefreq = record
        .changefreq()
        .map_or_else(|| "-".to_string(), |freq| freq.to_string());
    let priority = record
        .priority()
        .map_or_else(|| "-".to_string(), |priority| format!("{priority:?}"));

    format!("{}  {lastmod}  {changefreq}  {priority}", record.loc())
}
