//! sitemill CLI - stream a sitemap, follow its index entries, print the records.

use anyhow::{Context, Result, bail};
use clap::Parser;
use sitemill_core::{HttpCrawler, ParserSettings, SitemapParser};
use std::sync::{Arc, Mutex, PoisonError};

mod cli;
mod logging;
mod output;

use cli::Cli;
use output::Delivery;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::initialize_logging(&cli)?;

    execute(&cli).await
}

fn load_settings(cli: &Cli) -> Result<ParserSettings> {
    let mut settings = match &cli.config {
        Some(path) => ParserSettings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => ParserSettings::default(),
    };
    cli.apply_overrides(&mut settings);
    Ok(settings)
}

async fn execute(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;
    let options = settings.to_options()?;

    let deliveries: Arc<Mutex<Vec<Delivery>>> = Arc::default();
    let failures: Arc<Mutex<Vec<String>>> = Arc::default();

    let crawler = Arc::new(HttpCrawler::new(&settings.fetch)?);
    let data_sink = Arc::clone(&deliveries);
    let error_sink = Arc::clone(&failures);
    let parser = Arc::new(
        SitemapParser::builder(crawler.clone())
            .options(options)
            .on_data(move |records, context| {
                data_sink
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(Delivery {
                        url: context.url.clone(),
                        records,
                    });
            })
            .on_error(move |error, context| {
                tracing::debug!(url = %context.url, error = %error, "Follow-up fetch failed");
                error_sink
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(format!("{} (listed in {})", error, context.url));
            })
            .build(),
    );
    crawler.attach(&parser)?;

    crawler
        .run(cli.url.as_str())
        .await
        .with_context(|| format!("Failed to fetch {}", cli.url))?;

    tracing::debug!(
        fetched = crawler.fetched_count(),
        cumulative = parser.cumulative().len(),
        "Crawl finished"
    );

    let deliveries = std::mem::take(&mut *deliveries.lock().unwrap_or_else(PoisonError::into_inner));
    let mut stdout = std::io::stdout().lock();
    output::render(cli.format, &deliveries, parser.cumulative().len(), &mut stdout)?;

    let failures = failures.lock().unwrap_or_else(PoisonError::into_inner);
    for failure in failures.iter() {
        eprintln!("error: {failure}");
    }
    if !failures.is_empty() {
        bail!("{} sitemap fetch(es) failed", failures.len());
    }

    Ok(())
}
