use anyhow::Result;
use clap::Parser;
use tracing::error;

use magpie::args::Command;
use magpie::config::CrawlConfig;
use magpie::progress::BarProgress;
use magpie::targets::{connect, crawl_regions, print_crawl_summary, print_run_summary, scrape_targets};
use magpie::utils::setup_logging;
use magpie::{Args, ScrapeConfig};

fn run_scrape(args: &Args) -> Result<()> {
    // Reject bad selections before any request goes out
    let config = ScrapeConfig::from_args(args)?;

    let summary = connect(&config.session)
        .and_then(|client| scrape_targets(&config, client, &BarProgress::default()))?;
    print_run_summary(&summary, &config);
    Ok(())
}

fn run_crawl(args: &magpie::args::RegionsArgs) -> Result<()> {
    let config = CrawlConfig::from_args(args)?;
    let units = crawl_regions(&config)?;
    print_crawl_summary(&units, &config);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);

    let result = match &args.command {
        Some(Command::CrawlRegions(crawl)) => run_crawl(crawl),
        None => run_scrape(&args),
    };

    if let Err(e) = result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
