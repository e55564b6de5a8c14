//! Crawls eBird's region pages into the region table used by the targets scrape.
//!
//! Every region page at `<base>/<code>/subregions` lists its children in a
//! leaderboard section. The crawl walks world → countries → regions →
//! sub-regions and flattens the tree into [`GeographicUnit`] rows.

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info};
use url::Url;

use crate::error::{Result, ScrapeError};
use crate::region::GeographicUnit;

pub const REGION_URL: &str = "https://ebird.org/region";
pub const WORLD: &str = "world";

const LEADERBOARD: &str = "div.LeaderBoardSection";
const ENTRY: &str = "a[href]";

/// One entry of a subregion listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Place {
    pub name: String,
    pub code: String,
}

pub struct RegionDirectory {
    client: Client,
    base: Url,
    leaderboard: Selector,
    entry: Selector,
}

fn selector(css: &'static str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScrapeError::Selector {
        selector: css,
        message: e.to_string(),
    })
}

impl RegionDirectory {
    pub fn new(client: Client, base: Url) -> Result<Self> {
        Ok(Self {
            client,
            base,
            leaderboard: selector(LEADERBOARD)?,
            entry: selector(ENTRY)?,
        })
    }

    fn subregions_url(&self, code: &str) -> Result<Url> {
        let base = self.base.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{code}/subregions"))?)
    }

    /// Children of `code`, in page order without duplicates.
    pub fn subregions(&self, code: &str) -> Result<Vec<Place>> {
        let url = self.subregions_url(code)?;
        let html = self.client.get(url).send()?.error_for_status()?.text()?;
        let places = self.parse_places(&html);

        debug!(
            action = "listed",
            component = "region_directory",
            code,
            children = places.len(),
            "Listed subregions"
        );
        Ok(places)
    }

    /// Entries of the first leaderboard section. The name comes from the link
    /// title (falling back to its text) and the code from the last path segment.
    pub fn parse_places(&self, html: &str) -> Vec<Place> {
        let doc = Html::parse_document(html);
        let Some(board) = doc.select(&self.leaderboard).next() else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        board
            .select(&self.entry)
            .filter_map(|link| {
                let href = link.value().attr("href")?;
                let code = href
                    .split(['?', '#'])
                    .next()?
                    .trim_end_matches('/')
                    .rsplit('/')
                    .next()?
                    .trim()
                    .to_string();
                let name = link
                    .value()
                    .attr("title")
                    .map(str::to_string)
                    .unwrap_or_else(|| link.text().collect::<String>())
                    .trim()
                    .to_string();
                (!code.is_empty() && !name.is_empty()).then_some(Place { name, code })
            })
            .filter(|place| seen.insert(place.code.clone()))
            .collect()
    }
}

fn unit(country: &Place, region: Option<&Place>, sub_region: Option<&Place>) -> GeographicUnit {
    GeographicUnit {
        country: country.name.clone(),
        country_code: country.code.clone(),
        region: region.map(|r| r.name.clone()),
        region_code: region.map(|r| r.code.clone()),
        sub_region: sub_region.map(|s| s.name.clone()),
        sub_region_code: sub_region.map(|s| s.code.clone()),
    }
}

/// Crawl the whole directory on a pool of `workers` threads.
///
/// Rows follow page order: countries, then their regions, then sub-regions.
/// A country without regions, or a region without sub-regions, still yields
/// one row carrying the codes it has.
pub fn crawl(directory: &RegionDirectory, workers: usize) -> Result<Vec<GeographicUnit>> {
    let start_time = Instant::now();
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("magpie-crawler-{i}"))
        .build()?;

    let countries = directory.subregions(WORLD)?;
    info!(
        action = "start",
        component = "region_directory",
        country_count = countries.len(),
        worker_count = workers,
        "Crawling region directory"
    );

    let units = pool.install(|| -> Result<Vec<Vec<GeographicUnit>>> {
        let regions = countries
            .par_iter()
            .map(|country| directory.subregions(&country.code))
            .collect::<Result<Vec<_>>>()?;

        let pairs: Vec<(&Place, Option<&Place>)> = countries
            .iter()
            .zip(&regions)
            .flat_map(|(country, regions)| {
                if regions.is_empty() {
                    vec![(country, None)]
                } else {
                    regions.iter().map(|region| (country, Some(region))).collect()
                }
            })
            .collect();

        pairs
            .par_iter()
            .map(|&(country, region)| {
                let Some(region) = region else {
                    return Ok(vec![unit(country, None, None)]);
                };
                let sub_regions = directory.subregions(&region.code)?;
                if sub_regions.is_empty() {
                    return Ok(vec![unit(country, Some(region), None)]);
                }
                Ok(sub_regions
                    .iter()
                    .map(|sub_region| unit(country, Some(region), Some(sub_region)))
                    .collect())
            })
            .collect::<Result<Vec<Vec<GeographicUnit>>>>()
    })?;

    let units: Vec<_> = units.into_iter().flatten().collect();
    info!(
        action = "complete",
        component = "region_directory",
        unit_count = units.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Region directory crawled"
    );
    Ok(units)
}
