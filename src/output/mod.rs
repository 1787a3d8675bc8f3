//! Report rendering for freshness results
//!
//! This module provides:
//! - Plaintext table output for human-readable display
//! - JSON output for machine processing

mod json;
mod text;

pub use json::JsonReporter;
pub use text::PlaintextReporter;

use crate::domain::DependencyFreshness;
use std::io::Write;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Text,
    /// JSON output for machine processing
    Json,
}

impl OutputFormat {
    pub fn from_cli(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Renders a finished run
pub trait Reporter {
    /// Write the report for `results` (in any order) to `writer`
    fn generate(
        &self,
        results: &[DependencyFreshness],
        writer: &mut dyn Write,
    ) -> std::io::Result<()>;
}

/// Create a reporter for the given format
pub fn create_reporter(format: OutputFormat, color: bool) -> Box<dyn Reporter> {
    match format {
        OutputFormat::Text => Box::new(PlaintextReporter::with_color(color)),
        OutputFormat::Json => Box::new(JsonReporter::new()),
    }
}

/// Results sorted by gem name
fn sorted_by_name(results: &[DependencyFreshness]) -> Vec<&DependencyFreshness> {
    let mut sorted: Vec<_> = results.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Text);
    }

    #[test]
    fn test_output_format_from_cli() {
        assert_eq!(OutputFormat::from_cli(true), OutputFormat::Json);
        assert_eq!(OutputFormat::from_cli(false), OutputFormat::Text);
    }

    #[test]
    fn test_create_reporter_empty_results() {
        let mut text = Vec::new();
        create_reporter(OutputFormat::Text, false)
            .generate(&[], &mut text)
            .unwrap();
        assert!(text.is_empty());

        let mut json = Vec::new();
        create_reporter(OutputFormat::Json, false)
            .generate(&[], &mut json)
            .unwrap();
        assert!(String::from_utf8(json).unwrap().contains("\"gems\": []"));
    }
}
