//! Command-line argument definitions.

use clap::{Parser, ValueEnum};
use sitemill_core::ParserSettings;
use std::path::PathBuf;

/// Output format for crawl results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One block per sitemap with a line per record
    #[default]
    Text,
    /// A single JSON document
    Json,
    /// One JSON record per line
    Jsonl,
}

impl OutputFormat {
    /// Whether the format is meant for other programs.
    pub const fn is_machine_readable(self) -> bool {
        matches!(self, Self::Json | Self::Jsonl)
    }
}

/// Stream a sitemap (or sitemap index) and print its records
#[derive(Parser, Clone, Debug)]
#[command(name = "sitemill")]
#[command(version)]
#[command(about = "sitemill - stream and follow XML sitemaps", long_about = None)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// URL of a sitemap or sitemap index
    #[arg(value_name = "URL")]
    pub url: String,

    /// Path to a TOML settings file. Also via `SITEMILL_CONFIG`.
    #[arg(long, value_name = "FILE", env = "SITEMILL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Do not fetch the sitemaps listed in an index
    #[arg(long)]
    pub no_follow: bool,

    /// Only parse responses fetched by index-following
    #[arg(long)]
    pub only_marked: bool,

    /// Regular expression the content-type header must match
    #[arg(long, value_name = "REGEX")]
    pub content_type: Option<String>,

    /// Regular expression the status code must match
    #[arg(long, value_name = "REGEX")]
    pub status: Option<String>,

    /// Regular expression the response URL must match
    #[arg(long = "url-filter", value_name = "REGEX")]
    pub url_filter: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Enable verbose output (debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Suppress informational messages (only show errors)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Disable all ANSI colors in output (also respects `NO_COLOR` env)
    #[arg(long = "no-color")]
    pub no_color: bool,
}

impl Cli {
    /// Apply command-line overrides on top of loaded settings.
    pub fn apply_overrides(&self, settings: &mut ParserSettings) {
        if self.no_follow {
            settings.follow = false;
        }
        if self.only_marked {
            settings.only_marked = true;
        }
        if let Some(pattern) = &self.content_type {
            settings.filter_content_type = Some(pattern.clone());
        }
        if let Some(pattern) = &self.status {
            settings.filter_status_code = Some(pattern.clone());
        }
        if let Some(pattern) = &self.url_filter {
            settings.filter_url = Some(pattern.clone());
        }
        if let Some(secs) = self.timeout {
            settings.fetch.timeout_secs = secs;
        }
    }
}
