//! Freshness result for a single locked gem

use chrono::NaiveDate;
use serde::Serialize;

/// Days per libyear
pub const DAYS_PER_YEAR: f64 = 365.0;

/// How far one locked gem is behind its latest release
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyFreshness {
    pub name: String,
    pub current_version: String,
    pub current_version_release_date: Option<NaiveDate>,
    pub latest_version: Option<String>,
    pub latest_version_release_date: Option<NaiveDate>,
    /// Releases between the installed version and the newest one
    pub version_distance: Option<u64>,
    pub libyear_in_days: Option<i64>,
    pub is_direct: bool,
}

impl DependencyFreshness {
    /// Staleness in years, if the day count is known
    pub fn libyears(&self) -> Option<f64> {
        self.libyear_in_days.map(|days| days as f64 / DAYS_PER_YEAR)
    }

    /// True when the installed version is known to be the latest release
    pub fn is_up_to_date(&self) -> bool {
        self.version_distance == Some(0)
    }
}

/// Sum of libyears over all results with a known day count
pub fn total_libyears(results: &[DependencyFreshness]) -> f64 {
    let days: i64 = results.iter().filter_map(|r| r.libyear_in_days).sum();
    days as f64 / DAYS_PER_YEAR
}

/// Sum of version distances over all results with a known distance
pub fn total_version_distance(results: &[DependencyFreshness]) -> u64 {
    results.iter().filter_map(|r| r.version_distance).sum()
}
