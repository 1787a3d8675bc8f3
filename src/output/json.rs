//! JSON reporter for machine processing

use crate::domain::{total_libyears, total_version_distance, DependencyFreshness};
use crate::output::{sorted_by_name, Reporter};
use serde::Serialize;
use std::io::Write;

/// JSON reporter; dates are ISO 8601 and gems are sorted by name
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReporter;

impl JsonReporter {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    gems: Vec<&'a DependencyFreshness>,
    total_libyears: f64,
    total_versions: u64,
}

impl Reporter for JsonReporter {
    fn generate(
        &self,
        results: &[DependencyFreshness],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let output = JsonOutput {
            gems: sorted_by_name(results),
            total_libyears: total_libyears(results),
            total_versions: total_version_distance(results),
        };

        let json = serde_json::to_string_pretty(&output).map_err(std::io::Error::other)?;
        writeln!(writer, "{}", json)
    }
}
