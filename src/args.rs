use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "magpie",
    about = "Scrape eBird target species frequencies for a table of regions",
    version,
    long_about = None,
    subcommand_negates_reqs = true
)]
#[command(group(ArgGroup::new("scope").args(["local", "region", "country", "world"])))]
#[command(group(ArgGroup::new("basis").args(["life", "ytd", "mtd", "day"])))]
#[command(group(ArgGroup::new("time_of_year").args(["month", "range", "year", "all_months"])))]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output CSV file
    #[arg(short, long, required = true)]
    pub output: Option<PathBuf>,

    /// Region table CSV (country, country_code, region, region_code, sub_region, sub_region_code)
    #[arg(long, default_value = "regions.csv")]
    pub regions: PathBuf,

    /// Compare each unit against itself
    #[arg(long)]
    pub local: bool,

    /// Compare each unit against its region
    #[arg(long)]
    pub region: bool,

    /// Compare each unit against its country
    #[arg(long)]
    pub country: bool,

    /// Compare each unit against the world (default)
    #[arg(long)]
    pub world: bool,

    /// Life list
    #[arg(long)]
    pub life: bool,

    /// Year-to-date list
    #[arg(long)]
    pub ytd: bool,

    /// Month-to-date list
    #[arg(long)]
    pub mtd: bool,

    /// Day list
    #[arg(long)]
    pub day: bool,

    /// Single month (1-12)
    #[arg(long)]
    pub month: Option<u32>,

    /// Month range START-END, e.g. 3-5
    #[arg(long)]
    pub range: Option<String>,

    /// Whole year, January to December
    #[arg(long)]
    pub year: bool,

    /// Every month separately
    #[arg(long)]
    pub all_months: bool,

    /// Number of worker threads
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Attempts per page before giving up on a page that is still loading
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Keep retrying pages that are still loading, without limit
    #[arg(long, conflicts_with = "max_attempts")]
    pub unbounded_retry: bool,

    /// Initial backoff delay in milliseconds, doubled on every retry
    #[arg(long, default_value_t = 1000)]
    pub initial_delay_ms: u64,

    /// Require exactly one percentage per species instead of truncating extras
    #[arg(long)]
    pub strict: bool,

    /// Targets endpoint
    #[arg(long, default_value = crate::fetcher::TARGETS_URL)]
    pub endpoint: String,

    /// Login form URL
    #[arg(long, default_value = crate::session::LOGIN_URL)]
    pub login_url: String,

    /// Account username
    #[arg(long, env = "MAGPIE_USERNAME")]
    pub username: Option<String>,

    /// Account password
    #[arg(long, env = "MAGPIE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Cookie header of an already signed-in session, used instead of logging in
    #[arg(long, env = "MAGPIE_COOKIE", hide_env_values = true)]
    pub cookie: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Crawl eBird's region pages and write a region table
    CrawlRegions(RegionsArgs),
}

#[derive(clap::Args, Debug)]
pub struct RegionsArgs {
    /// Region table to write
    #[arg(short, long, default_value = "regions.csv")]
    pub output: PathBuf,

    /// Base URL of the region pages
    #[arg(long, default_value = crate::directory::REGION_URL)]
    pub base_url: String,

    /// Number of worker threads
    #[arg(short, long)]
    pub workers: Option<usize>,
}
