use chrono::Month;

use crate::error::ConfigError;

/// Historical period over which the observation frequency is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatisticBasis {
    Life,
    YearToDate,
    MonthToDate,
    Day,
}

impl StatisticBasis {
    /// Value of the `t2` query parameter.
    pub fn as_query(&self) -> &'static str {
        match self {
            StatisticBasis::Life => "life",
            StatisticBasis::YearToDate => "year",
            StatisticBasis::MonthToDate => "month",
            StatisticBasis::Day => "day",
        }
    }
}

/// Which months of the year a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeOfYear {
    Month(u32),
    /// Raw `START-END` text, validated on expansion.
    Range(String),
    FullYear,
    AllMonths,
}

impl TimeOfYear {
    /// Collapse the four mutually exclusive selectors into one value.
    pub fn from_selectors(
        month: Option<u32>,
        range: Option<&str>,
        full_year: bool,
        all_months: bool,
    ) -> Result<Option<TimeOfYear>, ConfigError> {
        let mut chosen = Vec::new();
        if let Some(m) = month {
            chosen.push(TimeOfYear::Month(m));
        }
        if let Some(r) = range {
            chosen.push(TimeOfYear::Range(r.to_string()));
        }
        if full_year {
            chosen.push(TimeOfYear::FullYear);
        }
        if all_months {
            chosen.push(TimeOfYear::AllMonths);
        }

        match chosen.len() {
            0 => Ok(None),
            1 => Ok(chosen.pop()),
            _ => Err(ConfigError::ConflictingTimeOfYear(
                chosen
                    .iter()
                    .map(TimeOfYear::flag)
                    .collect::<Vec<_>>()
                    .join(", "),
            )),
        }
    }

    fn flag(&self) -> &'static str {
        match self {
            TimeOfYear::Month(_) => "--month",
            TimeOfYear::Range(_) => "--range",
            TimeOfYear::FullYear => "--year",
            TimeOfYear::AllMonths => "--all-months",
        }
    }
}

/// One temporal filter: statistic basis plus inclusive month bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    pub basis: StatisticBasis,
    pub start_month: u32,
    pub end_month: u32,
}

impl TimeWindow {
    pub fn start_label(&self) -> &'static str {
        month_name(self.start_month)
    }

    pub fn end_label(&self) -> &'static str {
        month_name(self.end_month)
    }
}

/// English month name for 1-12. Windows only hold validated months, so the
/// fallback is never rendered for them.
pub fn month_name(month: u32) -> &'static str {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
        .unwrap_or("Unknown")
}

fn check_month(month: u32) -> Result<u32, ConfigError> {
    if (1..=12).contains(&month) {
        Ok(month)
    } else {
        Err(ConfigError::MonthOutOfRange(month))
    }
}

/// Parse `"A-B"` into month bounds. `A > B` is passed through unchanged.
pub fn parse_month_range(range: &str) -> Result<(u32, u32), ConfigError> {
    let invalid = || ConfigError::InvalidRange(range.to_string());

    let (start, end) = range.split_once('-').ok_or_else(invalid)?;
    let start: u32 = start.trim().parse().map_err(|_| invalid())?;
    let end: u32 = end.trim().parse().map_err(|_| invalid())?;

    if !(1..=12).contains(&start) || !(1..=12).contains(&end) {
        return Err(ConfigError::RangeError { start, end });
    }
    Ok((start, end))
}

/// Expand the selections into the ordered list of windows a run will query.
pub fn expand(
    basis: Option<StatisticBasis>,
    time_of_year: Option<&TimeOfYear>,
) -> Result<Vec<TimeWindow>, ConfigError> {
    let basis = basis.ok_or(ConfigError::MissingStatisticBasis)?;
    let time_of_year = time_of_year.ok_or(ConfigError::MissingTimeOfYear)?;

    let window = |start_month, end_month| TimeWindow {
        basis,
        start_month,
        end_month,
    };

    let windows = match time_of_year {
        TimeOfYear::Month(m) => {
            let m = check_month(*m)?;
            vec![window(m, m)]
        }
        TimeOfYear::Range(r) => {
            let (start, end) = parse_month_range(r)?;
            vec![window(start, end)]
        }
        TimeOfYear::FullYear => vec![window(1, 12)],
        TimeOfYear::AllMonths => (1..=12).map(|m| window(m, m)).collect(),
    };

    Ok(windows)
}
