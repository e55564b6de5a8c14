use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::info;

use crate::error::Result;

pub const REGION_COLUMNS: [&str; 6] = [
    "country",
    "country_code",
    "region",
    "region_code",
    "sub_region",
    "sub_region_code",
];

/// One row of the region table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct GeographicUnit {
    pub country: String,
    pub country_code: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub region_code: Option<String>,
    #[serde(default)]
    pub sub_region: Option<String>,
    #[serde(default)]
    pub sub_region_code: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl GeographicUnit {
    pub fn region_code(&self) -> Option<&str> {
        non_blank(&self.region_code)
    }

    pub fn sub_region_code(&self) -> Option<&str> {
        non_blank(&self.sub_region_code)
    }

    /// Most granular code available for this unit.
    pub fn most_specific_code(&self) -> &str {
        self.sub_region_code()
            .or_else(|| self.region_code())
            .unwrap_or(self.country_code.trim())
    }
}

/// Geographic basis the unit's frequencies are compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    #[default]
    World,
    Country,
    Region,
    SubRegion,
}

impl Scope {
    /// Location parameters `(r1, r2)` for one unit.
    pub fn resolve(&self, unit: &GeographicUnit) -> (String, String) {
        let r1 = unit.most_specific_code();
        let country = unit.country_code.trim();
        let r2 = match self {
            Scope::World => "world",
            Scope::Country => country,
            Scope::Region => unit.region_code().unwrap_or(country),
            Scope::SubRegion => unit.sub_region_code().unwrap_or(r1),
        };
        (r1.to_string(), r2.to_string())
    }
}

/// Load the region table from CSV. Blank cells become `None`.
pub fn load_units(path: &Path) -> Result<Vec<GeographicUnit>> {
    let start_time = Instant::now();
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;

    let units = reader
        .deserialize()
        .collect::<std::result::Result<Vec<GeographicUnit>, csv::Error>>()?;

    info!(
        action = "loaded",
        component = "region_table",
        file_path = ?path,
        unit_count = units.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Loaded geographic units"
    );
    Ok(units)
}

/// Write a region table in the layout `load_units` reads. Absent names and
/// codes are written as empty cells.
pub fn write_units(path: &Path, units: &[GeographicUnit]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(REGION_COLUMNS)?;
    for unit in units {
        writer.serialize(unit)?;
    }
    writer.flush()?;

    info!(
        action = "written",
        component = "region_table",
        file_path = ?path,
        unit_count = units.len(),
        "Wrote geographic units"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn manhattan() -> GeographicUnit {
        GeographicUnit {
            country: "United States".into(),
            country_code: "US".into(),
            region: Some("New York".into()),
            region_code: Some("US-NY".into()),
            sub_region: Some("New York".into()),
            sub_region_code: Some("US-NY-061".into()),
        }
    }

    #[test]
    fn r1_is_most_specific_for_every_scope() {
        let unit = manhattan();
        for scope in [Scope::World, Scope::Country, Scope::Region, Scope::SubRegion] {
            assert_eq!(scope.resolve(&unit).0, "US-NY-061");
        }
    }

    #[test]
    fn r2_follows_scope() {
        let unit = manhattan();
        assert_eq!(Scope::World.resolve(&unit).1, "world");
        assert_eq!(Scope::Country.resolve(&unit).1, "US");
        assert_eq!(Scope::Region.resolve(&unit).1, "US-NY");
        assert_eq!(Scope::SubRegion.resolve(&unit).1, "US-NY-061");
    }

    #[test]
    fn coarse_units_fall_back() {
        let unit = GeographicUnit {
            country: "Iceland".into(),
            country_code: "IS".into(),
            region: None,
            region_code: Some("  ".into()),
            sub_region: None,
            sub_region_code: None,
        };
        assert_eq!(Scope::Region.resolve(&unit), ("IS".into(), "IS".into()));
        assert_eq!(Scope::SubRegion.resolve(&unit), ("IS".into(), "IS".into()));
        assert_eq!(Scope::World.resolve(&unit), ("IS".into(), "world".into()));
    }

    #[test]
    fn loads_table_with_blank_codes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "country,country_code,region,region_code,sub_region,sub_region_code\n\
             United States,US,New York,US-NY,New York,US-NY-061\n\
             Costa Rica,CR,Limón,CR-L,,"
        )
        .unwrap();

        let units = load_units(file.path()).unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0], manhattan());
        assert_eq!(units[1].sub_region_code(), None);
        assert_eq!(units[1].most_specific_code(), "CR-L");
    }

    #[test]
    fn written_table_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regions.csv");
        let iceland = GeographicUnit {
            country: "Iceland".into(),
            country_code: "IS".into(),
            region: None,
            region_code: None,
            sub_region: None,
            sub_region_code: None,
        };

        write_units(&path, &[manhattan(), iceland.clone()]).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written.lines().next(),
            Some("country,country_code,region,region_code,sub_region,sub_region_code")
        );
        assert_eq!(load_units(&path).unwrap(), vec![manhattan(), iceland]);
    }
}
