use anyhow::{Context, Result};
use reqwest::blocking::Client;
use std::time::Instant;
use tracing::info;

use crate::config::{CrawlConfig, ScrapeConfig, SessionSource};
use crate::directory::{self, RegionDirectory};
use crate::fetcher::{HttpSource, PageFetcher};
use crate::progress::Progress;
use crate::region::GeographicUnit;
use crate::table::ResultTable;
use crate::{region, scrape, session};

/// Outcome of a complete run.
#[derive(Debug)]
pub struct RunSummary {
    pub work_units: usize,
    pub table: ResultTable,
}

/// Build the authenticated client described by the configuration.
pub fn connect(source: &SessionSource) -> Result<Client> {
    match source {
        SessionSource::Cookie(cookie) => {
            session::with_cookie(cookie).context("Failed to build client from cookie")
        }
        SessionSource::Login { url, credentials } => {
            let client = session::build_client()?;
            session::login(&client, url, credentials)?;
            Ok(client)
        }
    }
}

/// Load regions, scrape every window × unit pair and write the result table.
pub fn scrape_targets(
    config: &ScrapeConfig,
    client: Client,
    progress: &dyn Progress,
) -> Result<RunSummary> {
    let total_start_time = Instant::now();
    info!(action = "start", component = "run", "Starting target species scrape");

    let units = region::load_units(&config.regions)
        .with_context(|| format!("Failed to read region table {:?}", config.regions))?;

    let source = HttpSource::new(client, config.endpoint.clone());
    let fetcher = PageFetcher::new(source, config.retry, config.reconcile)?;

    let table = scrape::scrape_all(
        &fetcher,
        &config.windows,
        &units,
        config.scope,
        config.workers,
        progress,
    )?;

    table
        .write_csv(&config.output)
        .with_context(|| format!("Failed to write {:?}", config.output))?;

    info!(
        action = "complete",
        component = "run",
        rows = table.len(),
        output = ?config.output,
        duration_ms = total_start_time.elapsed().as_millis(),
        "Run completed successfully"
    );

    Ok(RunSummary {
        work_units: config.windows.len() * units.len(),
        table,
    })
}

pub fn print_run_summary(summary: &RunSummary, config: &ScrapeConfig) {
    println!("\n--- Target Species ---");
    println!(
        "Work units: {} ({} time windows)",
        crate::utils::format_number(summary.work_units),
        config.windows.len()
    );
    println!(
        "Rows written: {}",
        crate::utils::format_number(summary.table.len())
    );
    println!("Output: {}", config.output.display());
}

/// Crawl the region directory and write the region table.
pub fn crawl_regions(config: &CrawlConfig) -> Result<Vec<GeographicUnit>> {
    let client = session::build_client()?;
    let directory = RegionDirectory::new(client, config.base.clone())?;
    let units = directory::crawl(&directory, config.workers)?;

    region::write_units(&config.output, &units)
        .with_context(|| format!("Failed to write {:?}", config.output))?;
    Ok(units)
}

pub fn print_crawl_summary(units: &[GeographicUnit], config: &CrawlConfig) {
    let countries = units
        .iter()
        .map(|u| u.country_code.as_str())
        .collect::<std::collections::HashSet<_>>()
        .len();

    println!("\n--- Region Table ---");
    println!("Countries: {}", crate::utils::format_number(countries));
    println!("Units: {}", crate::utils::format_number(units.len()));
    println!("Output: {}", config.output.display());
}
