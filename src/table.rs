use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::fetcher::ParsedSpecies;
use crate::region::GeographicUnit;
use crate::time_window::TimeWindow;

pub const COMMON_NAME: &str = "common name";
pub const SCIENTIFIC_NAME: &str = "scientific name";
pub const PROVENANCE_COLUMNS: [&str; 7] = [
    "percent",
    "country",
    "region",
    "sub region",
    "code",
    "start month",
    "end month",
];

/// One observation record with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesRow {
    pub common_name: Option<String>,
    pub scientific_name: Option<String>,
    pub percent: f64,
    pub country: String,
    pub region: String,
    pub sub_region: String,
    pub code: String,
    pub start_month: &'static str,
    pub end_month: &'static str,
}

/// Rows produced by one (window, unit) work unit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Batch {
    pub rows: Vec<SpeciesRow>,
    pub has_common_name: bool,
    pub has_scientific_name: bool,
}

impl Batch {
    /// Stamp parsed species with the unit's provenance. The common-name column
    /// is dropped when no row has one.
    pub fn stamp(
        species: Vec<ParsedSpecies>,
        unit: &GeographicUnit,
        code: &str,
        window: &TimeWindow,
    ) -> Self {
        if species.is_empty() {
            return Batch::default();
        }

        let has_common_name = species.iter().any(|s| s.name.common.is_some());
        let has_scientific_name = species.iter().any(|s| s.name.scientific.is_some());

        let rows = species
            .into_iter()
            .map(|s| SpeciesRow {
                common_name: s.name.common,
                scientific_name: s.name.scientific,
                percent: s.percent,
                country: unit.country.clone(),
                region: unit.region.clone().unwrap_or_default(),
                sub_region: unit.sub_region.clone().unwrap_or_default(),
                code: code.to_string(),
                start_month: window.start_label(),
                end_month: window.end_label(),
            })
            .collect();

        Batch {
            rows,
            has_common_name,
            has_scientific_name,
        }
    }
}

/// Concatenation of all batches of a run, in dispatch order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultTable {
    pub rows: Vec<SpeciesRow>,
    pub has_common_name: bool,
    pub has_scientific_name: bool,
}

impl ResultTable {
    pub fn concat(batches: Vec<Batch>) -> Self {
        let mut table = ResultTable::default();
        for mut batch in batches {
            table.has_common_name |= batch.has_common_name;
            table.has_scientific_name |= batch.has_scientific_name;
            table.rows.append(&mut batch.rows);
        }
        table
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> Vec<&'static str> {
        let mut headers = Vec::with_capacity(PROVENANCE_COLUMNS.len() + 2);
        if self.has_common_name {
            headers.push(COMMON_NAME);
        }
        if self.has_scientific_name {
            headers.push(SCIENTIFIC_NAME);
        }
        headers.extend(PROVENANCE_COLUMNS);
        headers
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let writer = csv::Writer::from_path(path)?;
        self.write_to(writer)
    }

    pub fn write_to<W: Write>(&self, mut writer: csv::Writer<W>) -> Result<()> {
        writer.write_record(self.headers())?;

        for row in &self.rows {
            let mut record: Vec<String> = Vec::with_capacity(PROVENANCE_COLUMNS.len() + 2);
            if self.has_common_name {
                record.push(row.common_name.clone().unwrap_or_default());
            }
            if self.has_scientific_name {
                record.push(row.scientific_name.clone().unwrap_or_default());
            }
            record.extend([
                row.percent.to_string(),
                row.country.clone(),
                row.region.clone(),
                row.sub_region.clone(),
                row.code.clone(),
                row.start_month.to_string(),
                row.end_month.to_string(),
            ]);
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SpeciesName;
    use crate::time_window::StatisticBasis;

    fn unit() -> GeographicUnit {
        GeographicUnit {
            country: "United States".into(),
            country_code: "US".into(),
            region: Some("New York".into()),
            region_code: Some("US-NY".into()),
            sub_region: Some("New York".into()),
            sub_region_code: Some("US-NY-061".into()),
        }
    }

    fn june() -> TimeWindow {
        TimeWindow {
            basis: StatisticBasis::Life,
            start_month: 6,
            end_month: 6,
        }
    }

    fn species(common: Option<&str>, scientific: Option<&str>, percent: f64) -> ParsedSpecies {
        ParsedSpecies {
            name: SpeciesName {
                common: common.map(String::from),
                scientific: scientific.map(String::from),
            },
            percent,
        }
    }

    fn to_csv(table: &ResultTable) -> String {
        let mut buf = Vec::new();
        table.write_to(csv::Writer::from_writer(&mut buf)).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn stamps_provenance() {
        let batch = Batch::stamp(
            vec![species(Some("Blue Jay"), Some("Cyanocitta cristata"), 2.5)],
            &unit(),
            "US-NY-061",
            &june(),
        );
        let row = &batch.rows[0];
        assert_eq!(row.country, "United States");
        assert_eq!(row.region, "New York");
        assert_eq!(row.code, "US-NY-061");
        assert_eq!((row.start_month, row.end_month), ("June", "June"));
        assert!(batch.has_common_name && batch.has_scientific_name);
    }

    #[test]
    fn drops_common_name_column_when_all_absent() {
        let batch = Batch::stamp(
            vec![
                species(None, Some("Anas platyrhynchos"), 10.0),
                species(None, Some("Mareca strepera"), 5.0),
            ],
            &unit(),
            "US-NY-061",
            &june(),
        );
        assert!(!batch.has_common_name);

        let table = ResultTable::concat(vec![batch]);
        let csv = to_csv(&table);
        assert_eq!(
            csv.lines().next(),
            Some("scientific name,percent,country,region,sub region,code,start month,end month")
        );
        assert!(csv.contains("Anas platyrhynchos,10,United States,New York,New York,US-NY-061,June,June"));
    }

    #[test]
    fn concat_keeps_batch_order_and_union_of_columns() {
        let first = Batch::stamp(
            vec![species(Some("Mallard"), None, 1.0)],
            &unit(),
            "A",
            &june(),
        );
        let second = Batch::stamp(
            vec![species(None, Some("Mareca strepera"), 2.0)],
            &unit(),
            "B",
            &june(),
        );
        let table = ResultTable::concat(vec![first, Batch::default(), second]);

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].code, "A");
        assert_eq!(table.rows[1].code, "B");
        assert_eq!(table.headers()[..2].to_vec(), vec![COMMON_NAME, SCIENTIFIC_NAME]);

        let csv = to_csv(&table);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[1], "Mallard,,1,United States,New York,New York,A,June,June");
        assert_eq!(lines[2], ",Mareca strepera,2,United States,New York,New York,B,June,June");
    }

    #[test]
    fn empty_table_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        ResultTable::default().write_csv(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written.lines().collect::<Vec<_>>(),
            vec!["percent,country,region,sub region,code,start month,end month"]
        );
    }
}
