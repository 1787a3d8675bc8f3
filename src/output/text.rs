//! Plaintext table reporter
//!
//! One row per outdated gem, sorted by name, followed by the totals.
//! Every cell is right-aligned in a column three characters wider than its
//! widest value. Up-to-date gems are left out and an all-current run prints
//! nothing at all.

use crate::domain::{total_libyears, total_version_distance, DependencyFreshness};
use crate::output::{sorted_by_name, Reporter};
use chrono::NaiveDate;
use colored::Colorize;
use std::io::Write;

const HEADERS: [&str; 8] = [
    "Gem",
    "Current",
    "Current Date",
    "Latest",
    "Latest Date",
    "Versions",
    "Days",
    "Years",
];

/// Extra width added to every column
const COLUMN_PADDING: usize = 3;

const UNKNOWN: &str = "Unknown";

/// Table reporter for terminals and logs
#[derive(Debug, Clone, Default)]
pub struct PlaintextReporter {
    /// Whether to use colors
    color: bool,
}

impl PlaintextReporter {
    /// Create a reporter without colors
    pub fn new() -> Self {
        Self { color: false }
    }

    /// Create a reporter with color option
    pub fn with_color(color: bool) -> Self {
        Self { color }
    }

    fn row(result: &DependencyFreshness) -> [String; 8] {
        [
            result.name.clone(),
            result.current_version.clone(),
            format_date(result.current_version_release_date),
            result
                .latest_version
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_string()),
            format_date(result.latest_version_release_date),
            result
                .version_distance
                .map_or_else(|| UNKNOWN.to_string(), |d| d.to_string()),
            result
                .libyear_in_days
                .map_or_else(|| UNKNOWN.to_string(), |d| d.to_string()),
            result
                .libyears()
                .map_or_else(|| UNKNOWN.to_string(), format_years),
        ]
    }

    fn format_line(cells: &[String], widths: &[usize]) -> String {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:>width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Reporter for PlaintextReporter {
    fn generate(
        &self,
        results: &[DependencyFreshness],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let rows: Vec<[String; 8]> = sorted_by_name(results)
            .into_iter()
            .filter(|r| !r.is_up_to_date())
            .map(Self::row)
            .collect();
        if rows.is_empty() {
            return Ok(());
        }

        let widths: Vec<usize> = HEADERS
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                rows.iter()
                    .map(|row| row[idx].chars().count())
                    .chain(std::iter::once(header.len()))
                    .max()
                    .unwrap_or(0)
                    + COLUMN_PADDING
            })
            .collect();

        let headers: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
        let header_line = Self::format_line(&headers, &widths);
        let divider = widths
            .iter()
            .map(|width| ".".repeat(*width))
            .collect::<Vec<_>>()
            .join(" ");

        if self.color {
            writeln!(writer, "{}", header_line.bold())?;
            writeln!(writer, "{}", divider.dimmed())?;
        } else {
            writeln!(writer, "{}", header_line)?;
            writeln!(writer, "{}", divider)?;
        }
        for row in &rows {
            writeln!(writer, "{}", Self::format_line(row, &widths))?;
        }

        let libyears = format_years(total_libyears(results));
        let releases = total_version_distance(results);
        if self.color {
            writeln!(
                writer,
                "System is {} libyears behind",
                libyears.yellow().bold()
            )?;
            writeln!(writer, "Total releases behind: {}", releases.to_string().bold())
        } else {
            writeln!(writer, "System is {} libyears behind", libyears)?;
            writeln!(writer, "Total releases behind: {}", releases)
        }
    }
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(
        || UNKNOWN.to_string(),
        |d| d.format("%Y-%m-%d").to_string(),
    )
}

fn format_years(years: f64) -> String {
    format!("{:.2}", years)
}
