use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

use crate::error::{Result, ScrapeError};

const SPECIES_COUNT: &str = "strong.Heading.Heading--h2";
const NATIVE: &str = r#"section[aria-labelledby="native-and-naturalized"]"#;
const ROW: &str = "li.ResultsStats";
const SPECIES: &str = "div.SpecimenHeader";
const LINK: &str = "a";
const PERCENT: &str = "div.ResultsStats-stats";
const PERCENT_TITLE: &str = r"^\s*([0-9]+(?:\.[0-9]+)?)\s*%";

/// Names of one listed species.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeciesName {
    pub common: Option<String>,
    pub scientific: Option<String>,
}

/// Extracts species rows, percentages and the ready indicator from a targets page.
pub struct PageParser {
    species_count: Selector,
    native: Selector,
    row: Selector,
    species: Selector,
    link: Selector,
    percent: Selector,
    percent_title: Regex,
}

fn selector(css: &'static str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScrapeError::Selector {
        selector: css,
        message: e.to_string(),
    })
}

impl PageParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            species_count: selector(SPECIES_COUNT)?,
            native: selector(NATIVE)?,
            row: selector(ROW)?,
            species: selector(SPECIES)?,
            link: selector(LINK)?,
            percent: selector(PERCENT)?,
            percent_title: Regex::new(PERCENT_TITLE)?,
        })
    }

    /// Species count shown in the results heading. Its absence means the server
    /// has not finished computing the list.
    pub fn species_count(&self, doc: &Html) -> Option<u32> {
        doc.select(&self.species_count).find_map(|strong| {
            let text: String = strong.text().collect();
            text.trim().replace(',', "").parse().ok()
        })
    }

    /// Rows of the native section that carry a linked species header, with that link.
    fn native_rows<'a>(&self, doc: &'a Html) -> Vec<(ElementRef<'a>, ElementRef<'a>)> {
        let Some(native) = doc.select(&self.native).next() else {
            return Vec::new();
        };

        native
            .select(&self.row)
            .filter_map(|row| {
                let link = row.select(&self.species).next()?.select(&self.link).next()?;
                Some((row, link))
            })
            .collect()
    }

    /// Species in the native section, plus whether the section is empty.
    pub fn parse_species(&self, doc: &Html) -> (Vec<SpeciesName>, bool) {
        let parts: Vec<Vec<String>> = self
            .native_rows(doc)
            .into_iter()
            .map(|(_, link)| link_parts(link))
            .collect();

        let Some(first) = parts.first() else {
            return (Vec::new(), true);
        };

        // The first row decides the shape of the whole batch.
        let two_names = first.len() > 1;
        let names = parts
            .into_iter()
            .map(|mut p| {
                if two_names {
                    let scientific = if p.len() > 1 { p.swap_remove(1) } else { String::new() };
                    let common = p.swap_remove(0);
                    SpeciesName {
                        common: Some(common).filter(|c| !c.is_empty()),
                        scientific: Some(scientific),
                    }
                } else {
                    let common = p.into_iter().next().unwrap_or_default();
                    SpeciesName {
                        common: Some(common).filter(|c| !c.is_empty()),
                        scientific: None,
                    }
                }
            })
            .collect();

        (names, false)
    }

    /// Observation frequency of each species row, read from the row itself.
    ///
    /// Collection stops at the first row whose statistics are not rendered yet,
    /// so the result is always aligned with the leading species rows. A title
    /// that is present but not a percentage is an error.
    pub fn parse_percentages(&self, doc: &Html) -> Result<Vec<f64>> {
        let mut percentages = Vec::new();

        for (row, _) in self.native_rows(doc) {
            let Some(title) = row
                .select(&self.percent)
                .next()
                .and_then(|stats| stats.value().attr("title"))
            else {
                debug!(
                    component = "page_parser",
                    parsed = percentages.len(),
                    "Species row without statistics"
                );
                break;
            };
            percentages.push(self.percent(title)?);
        }

        Ok(percentages)
    }

    fn percent(&self, title: &str) -> Result<f64> {
        self.percent_title
            .captures(title)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .ok_or_else(|| ScrapeError::Percentage {
                title: title.to_string(),
            })
    }
}

/// Trimmed text of each child node of a species link: common name first,
/// then the scientific name when the page shows both.
fn link_parts(link: ElementRef<'_>) -> Vec<String> {
    link.children()
        .filter_map(|child| match child.value() {
            Node::Text(text) => Some(text.trim().to_string()),
            Node::Element(_) => ElementRef::wrap(child)
                .map(|el| el.text().collect::<String>().trim().to_string()),
            _ => None,
        })
        .collect()
}
