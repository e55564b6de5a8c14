use thiserror::Error;

/// Problems with the requested run, detected before any request is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("statistic basis missing: choose one of --life, --ytd, --mtd or --day")]
    MissingStatisticBasis,

    #[error("time of year missing: choose one of --month, --range, --year or --all-months")]
    MissingTimeOfYear,

    #[error("conflicting time of year selections: {0}")]
    ConflictingTimeOfYear(String),

    #[error("month {0} is outside 1-12")]
    MonthOutOfRange(u32),

    #[error("invalid month range '{0}', expected START-END")]
    InvalidRange(String),

    #[error("month range endpoints out of range: {start}-{end}")]
    RangeError { start: u32, end: u32 },

    #[error("--output is required")]
    MissingOutput,

    #[error("--workers must be greater than 0")]
    ZeroWorkers,

    #[error("--max-attempts must be greater than 0")]
    ZeroAttempts,

    #[error("invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("no session: pass --cookie, or --username and --password")]
    MissingSession,
}

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("page for {code} still loading after {attempts} attempts")]
    RetriesExhausted { code: String, attempts: u32 },

    #[error("invalid selector '{selector}': {message}")]
    Selector { selector: &'static str, message: String },

    #[error("unreadable percentage '{title}'")]
    Percentage { title: String },

    #[error("session expired: request for {requested} landed on {landing}")]
    SessionExpired { requested: String, landing: String },

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("login failed: {0}")]
    Login(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("could not start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
