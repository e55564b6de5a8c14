use crate::region::{GeographicUnit, Scope};
use crate::time_window::{StatisticBasis, TimeWindow};

/// Request parameters for one (window, unit) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pub basis: StatisticBasis,
    pub start_month: u32,
    pub end_month: u32,
    /// Unit being listed, always its most specific code.
    pub r1: String,
    /// Comparison scope code.
    pub r2: String,
}

impl QueryParams {
    pub fn new(window: &TimeWindow, unit: &GeographicUnit, scope: Scope) -> Self {
        let (r1, r2) = scope.resolve(unit);
        Self {
            basis: window.basis,
            start_month: window.start_month,
            end_month: window.end_month,
            r1,
            r2,
        }
    }

    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("t2", self.basis.as_query().to_string()),
            ("bmo", self.start_month.to_string()),
            ("emo", self.end_month.to_string()),
            ("r1", self.r1.clone()),
            ("r2", self.r2.clone()),
        ]
    }
}
