pub mod args;
pub mod config;
pub mod directory;
pub mod error;
pub mod fetcher;
pub mod parser;
pub mod progress;
pub mod query;
pub mod region;
pub mod scrape;
pub mod session;
pub mod table;
pub mod targets;
pub mod time_window;
pub mod utils;

pub use args::Args;
pub use config::{CrawlConfig, ScrapeConfig, SessionSource};
pub use error::{ConfigError, Result, ScrapeError};
pub use fetcher::{HttpSource, PageFetcher, PageSource, ReconcilePolicy, RetryPolicy};
pub use region::{GeographicUnit, Scope};
pub use scrape::{scrape_all, scrape_unit};
pub use table::{Batch, ResultTable};
pub use targets::{crawl_regions, print_run_summary, scrape_targets, RunSummary};
pub use time_window::{StatisticBasis, TimeOfYear, TimeWindow};
