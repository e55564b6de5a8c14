mod common;

use url::Url;

use common::{FixtureServer, Reply};
use magpie::directory::{self, RegionDirectory};
use magpie::region::{load_units, write_units};
use magpie::session;
use magpie::GeographicUnit;

fn leaderboard(entries: &[(&str, &str)]) -> String {
    let rows: String = entries
        .iter()
        .map(|(code, name)| format!(r#"<li><a href="/region/{code}" title="{name}">{name}</a></li>"#))
        .collect();
    format!(r#"<html><body><div class="LeaderBoardSection"><ol>{rows}</ol></div></body></html>"#)
}

fn unit(
    country: (&str, &str),
    region: Option<(&str, &str)>,
    sub_region: Option<(&str, &str)>,
) -> GeographicUnit {
    GeographicUnit {
        country: country.1.into(),
        country_code: country.0.into(),
        region: region.map(|r| r.1.into()),
        region_code: region.map(|r| r.0.into()),
        sub_region: sub_region.map(|s| s.1.into()),
        sub_region_code: sub_region.map(|s| s.0.into()),
    }
}

fn directory_server() -> FixtureServer {
    FixtureServer::start(|hit, _| match hit.path() {
        "/region/world/subregions" => Reply::ok(leaderboard(&[("US", "United States"), ("IS", "Iceland")])),
        "/region/US/subregions" => Reply::ok(leaderboard(&[("US-NY", "New York"), ("US-VT", "Vermont")])),
        "/region/IS/subregions" => Reply::ok(leaderboard(&[])),
        "/region/US-NY/subregions" => Reply::ok(leaderboard(&[
            ("US-NY-061", "New York"),
            ("US-NY-047", "Kings"),
            ("US-NY-061", "New York"),
        ])),
        "/region/US-VT/subregions" => Reply::ok("<html><body>No subregions</body></html>"),
        _ => Reply::status(404),
    })
}

#[test]
fn crawl_flattens_directory_in_page_order() {
    let server = directory_server();
    let base = Url::parse(&server.url("/region")).unwrap();
    let directory = RegionDirectory::new(session::build_client().unwrap(), base).unwrap();

    let units = directory::crawl(&directory, 4).unwrap();

    let us = ("US", "United States");
    let ny = ("US-NY", "New York");
    assert_eq!(
        units,
        vec![
            unit(us, Some(ny), Some(("US-NY-061", "New York"))),
            unit(us, Some(ny), Some(("US-NY-047", "Kings"))),
            unit(us, Some(("US-VT", "Vermont")), None),
            unit(("IS", "Iceland"), None, None),
        ]
    );
    assert_eq!(server.hits().len(), 5);
}

#[test]
fn crawled_table_feeds_the_scrape() {
    let server = directory_server();
    let base = Url::parse(&server.url("/region")).unwrap();
    let directory = RegionDirectory::new(session::build_client().unwrap(), base).unwrap();
    let units = directory::crawl(&directory, 2).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("regions.csv");
    write_units(&path, &units).unwrap();

    let loaded = load_units(&path).unwrap();
    assert_eq!(loaded, units);
    let codes: Vec<_> = loaded.iter().map(|u| u.most_specific_code()).collect();
    assert_eq!(codes, vec!["US-NY-061", "US-NY-047", "US-VT", "IS"]);
}

#[test]
fn missing_directory_page_is_an_error() {
    let server = FixtureServer::start(|hit, _| match hit.path() {
        "/region/world/subregions" => Reply::ok(leaderboard(&[("ZZ", "Nowhere")])),
        _ => Reply::status(500),
    });
    let base = Url::parse(&server.url("/region")).unwrap();
    let directory = RegionDirectory::new(session::build_client().unwrap(), base).unwrap();

    assert!(directory::crawl(&directory, 2).is_err());
}
