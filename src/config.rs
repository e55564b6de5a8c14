use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::args::{Args, RegionsArgs};
use crate::error::ConfigError;
use crate::fetcher::{ReconcilePolicy, RetryPolicy, DEFAULT_MAX_ATTEMPTS};
use crate::region::Scope;
use crate::scrape::DEFAULT_WORKERS;
use crate::session::Credentials;
use crate::time_window::{self, StatisticBasis, TimeOfYear, TimeWindow};

/// Where the authenticated session comes from.
#[derive(Debug, Clone)]
pub enum SessionSource {
    Cookie(String),
    Login { url: Url, credentials: Credentials },
}

/// Validated settings for one run.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub windows: Vec<TimeWindow>,
    pub scope: Scope,
    pub workers: usize,
    pub retry: RetryPolicy,
    pub reconcile: ReconcilePolicy,
    pub endpoint: Url,
    pub session: SessionSource,
    pub regions: PathBuf,
    pub output: PathBuf,
}

fn parse_url(url: &str) -> Result<Url, ConfigError> {
    Url::parse(url).map_err(|e| ConfigError::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    })
}

impl Args {
    pub fn scope(&self) -> Scope {
        if self.local {
            Scope::SubRegion
        } else if self.region {
            Scope::Region
        } else if self.country {
            Scope::Country
        } else {
            Scope::World
        }
    }

    pub fn statistic_basis(&self) -> Option<StatisticBasis> {
        if self.life {
            Some(StatisticBasis::Life)
        } else if self.ytd {
            Some(StatisticBasis::YearToDate)
        } else if self.mtd {
            Some(StatisticBasis::MonthToDate)
        } else if self.day {
            Some(StatisticBasis::Day)
        } else {
            None
        }
    }

    pub fn time_of_year(&self) -> Result<Option<TimeOfYear>, ConfigError> {
        TimeOfYear::from_selectors(self.month, self.range.as_deref(), self.year, self.all_months)
    }

    fn session_source(&self) -> Result<SessionSource, ConfigError> {
        if let Some(cookie) = self.cookie.as_deref().filter(|c| !c.trim().is_empty()) {
            return Ok(SessionSource::Cookie(cookie.to_string()));
        }
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Ok(SessionSource::Login {
                url: parse_url(&self.login_url)?,
                credentials: Credentials {
                    username: username.clone(),
                    password: password.clone(),
                },
            }),
            _ => Err(ConfigError::MissingSession),
        }
    }
}

impl ScrapeConfig {
    /// Validate the command line. Nothing here touches the network.
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let time_of_year = args.time_of_year()?;
        let windows = time_window::expand(args.statistic_basis(), time_of_year.as_ref())?;

        let workers = args.workers.unwrap_or(DEFAULT_WORKERS);
        if workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }

        let max_attempts = if args.unbounded_retry {
            None
        } else {
            Some(args.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS))
        };
        if max_attempts == Some(0) {
            return Err(ConfigError::ZeroAttempts);
        }

        let reconcile = if args.strict {
            ReconcilePolicy::Strict
        } else {
            ReconcilePolicy::Lenient
        };

        Ok(Self {
            windows,
            scope: args.scope(),
            workers,
            retry: RetryPolicy {
                initial_delay: Duration::from_millis(args.initial_delay_ms),
                max_attempts,
            },
            reconcile,
            endpoint: parse_url(&args.endpoint)?,
            session: args.session_source()?,
            regions: args.regions.clone(),
            output: args.output.clone().ok_or(ConfigError::MissingOutput)?,
        })
    }
}

/// Validated settings for a region directory crawl.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub base: Url,
    pub workers: usize,
    pub output: PathBuf,
}

impl CrawlConfig {
    pub fn from_args(args: &RegionsArgs) -> Result<Self, ConfigError> {
        let workers = args.workers.unwrap_or(DEFAULT_WORKERS);
        if workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }

        Ok(Self {
            base: parse_url(&args.base_url)?,
            workers,
            output: args.output.clone(),
        })
    }
}
