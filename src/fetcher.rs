use reqwest::blocking::Client;
use scraper::Html;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Result, ScrapeError};
use crate::parser::{PageParser, SpeciesName};
use crate::query::QueryParams;

pub const TARGETS_URL: &str = "https://ebird.org/targets";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 12;

/// Anything that can return the raw targets page for a set of parameters.
pub trait PageSource: Sync {
    fn get(&self, params: &QueryParams) -> Result<String>;
}

/// Production source: GET against the targets endpoint with the session client.
pub struct HttpSource {
    client: Client,
    endpoint: Url,
}

impl HttpSource {
    pub fn new(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }
}

impl PageSource for HttpSource {
    fn get(&self, params: &QueryParams) -> Result<String> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&params.to_pairs())
            .send()?;

        // Expired sessions are redirected to the sign-in or home page.
        let landing = response.url();
        if landing.origin() != self.endpoint.origin() || landing.path() != self.endpoint.path() {
            return Err(ScrapeError::SessionExpired {
                requested: self.endpoint.to_string(),
                landing: landing.to_string(),
            });
        }

        Ok(response.error_for_status()?.text()?)
    }
}

/// How long and how often to wait for a page that is still rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    /// `None` retries until the page is ready.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self) -> Backoff {
        Backoff {
            next: self.initial_delay,
        }
    }
}

/// Doubling delays: 1, 2, 4, 8 … times the initial delay.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next;
        self.next = current.saturating_mul(2);
        Some(current)
    }
}

/// What to do when the percentage list and species list disagree in length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcilePolicy {
    /// Truncate extra percentages; a short list means the page is still loading.
    #[default]
    Lenient,
    /// Any length mismatch means the page is still loading.
    Strict,
}

impl ReconcilePolicy {
    /// Percentages aligned with `species` rows, or `None` when the page must be refetched.
    pub fn reconcile(&self, species: usize, mut percentages: Vec<f64>) -> Option<Vec<f64>> {
        match self {
            ReconcilePolicy::Lenient if percentages.len() >= species => {
                percentages.truncate(species);
                Some(percentages)
            }
            ReconcilePolicy::Strict if percentages.len() == species => Some(percentages),
            _ => None,
        }
    }
}

/// One species of a fetched page with its observation frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSpecies {
    pub name: SpeciesName,
    pub percent: f64,
}

enum PageState {
    Loading,
    Ready(Vec<ParsedSpecies>),
}

/// Fetches and parses one targets page, waiting out server-side rendering.
pub struct PageFetcher<S> {
    source: S,
    parser: PageParser,
    retry: RetryPolicy,
    reconcile: ReconcilePolicy,
}

impl<S: PageSource> PageFetcher<S> {
    pub fn new(source: S, retry: RetryPolicy, reconcile: ReconcilePolicy) -> Result<Self> {
        Ok(Self {
            source,
            parser: PageParser::new()?,
            retry,
            reconcile,
        })
    }

    /// Fetch the page for `params`, retrying with exponential backoff until it is
    /// ready. An empty native section is returned as an empty list.
    pub fn fetch(&self, params: &QueryParams) -> Result<Vec<ParsedSpecies>> {
        let start_time = Instant::now();
        let mut delays = self.retry.backoff();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let html = self.source.get(params)?;

            let state = match self.inspect(&html) {
                Ok(state) => state,
                Err(e) => {
                    warn!(
                        action = "parse_failed",
                        component = "page_fetcher",
                        code = %params.r1,
                        attempts = attempt,
                        error = %e,
                        "Page could not be read"
                    );
                    return Err(e);
                }
            };

            if let PageState::Ready(species) = state {
                info!(
                    action = "fetched",
                    component = "page_fetcher",
                    code = %params.r1,
                    scope = %params.r2,
                    species_count = species.len(),
                    attempts = attempt,
                    duration_ms = start_time.elapsed().as_millis(),
                    "Page ready"
                );
                return Ok(species);
            }

            if self.retry.max_attempts.is_some_and(|max| attempt >= max) {
                warn!(
                    action = "give_up",
                    component = "page_fetcher",
                    code = %params.r1,
                    attempts = attempt,
                    "Page still loading after final attempt"
                );
                return Err(ScrapeError::RetriesExhausted {
                    code: params.r1.clone(),
                    attempts: attempt,
                });
            }

            let delay = delays.next().unwrap_or(self.retry.initial_delay);
            debug!(
                action = "retry",
                component = "page_fetcher",
                code = %params.r1,
                attempt,
                delay_ms = delay.as_millis(),
                "Page still loading, backing off"
            );
            thread::sleep(delay);
        }
    }

    fn inspect(&self, html: &str) -> Result<PageState> {
        let doc = Html::parse_document(html);

        if self.parser.species_count(&doc).is_none() {
            return Ok(PageState::Loading);
        }

        let (names, is_empty) = self.parser.parse_species(&doc);
        if is_empty {
            return Ok(PageState::Ready(Vec::new()));
        }

        let percentages = self.parser.parse_percentages(&doc)?;
        Ok(match self.reconcile.reconcile(names.len(), percentages) {
            Some(percentages) => PageState::Ready(
                names
                    .into_iter()
                    .zip(percentages)
                    .map(|(name, percent)| ParsedSpecies { name, percent })
                    .collect(),
            ),
            None => PageState::Loading,
        })
    }
}
