//! Freshness of an installed version against its version history

use crate::domain::{DependencyFreshness, GemVersion, VersionNumber};
use tracing::warn;

/// Reduces an installed version and its history to a freshness result
pub trait FreshnessAnalyzer: Send + Sync {
    /// `versions` must be ordered newest first. Returns None when the gem is
    /// up to date or the installed version is unknown to the registry.
    fn freshness(
        &self,
        name: &str,
        installed_version: &str,
        versions: &[GemVersion],
    ) -> Option<DependencyFreshness>;
}

/// Libyear analyzer for gems
///
/// A stable installed version is compared against the newest stable
/// release; a prerelease is compared against the newest version of any kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyAnalyzer;

impl DependencyAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl FreshnessAnalyzer for DependencyAnalyzer {
    fn freshness(
        &self,
        name: &str,
        installed_version: &str,
        versions: &[GemVersion],
    ) -> Option<DependencyFreshness> {
        let target = VersionNumber::parse(installed_version).ok();
        let Some((distance, installed)) = versions
            .iter()
            .enumerate()
            .find(|(_, v)| Some(&v.number) == target.as_ref())
        else {
            warn!(
                "Skipping {}: installed version {} not found in metadata",
                name, installed_version
            );
            return None;
        };

        let latest = if installed.prerelease {
            versions.first()
        } else {
            versions.iter().find(|v| !v.prerelease)
        }?;

        if latest.number == installed.number {
            return None;
        }

        let days = (latest.created_at - installed.created_at).num_days().max(0);

        Some(DependencyFreshness {
            name: name.to_string(),
            current_version: installed_version.to_string(),
            current_version_release_date: Some(installed.created_at),
            latest_version: Some(latest.number.to_string()),
            latest_version_release_date: Some(latest.created_at),
            version_distance: Some(distance as u64),
            libyear_in_days: Some(days),
            is_direct: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn version(number: &str, date: &str) -> GemVersion {
        let number = VersionNumber::parse(number).unwrap();
        let prerelease = number.is_prerelease();
        GemVersion::new(
            "rails",
            number,
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            prerelease,
        )
    }

    fn history() -> Vec<GemVersion> {
        vec![
            version("7.0.0", "2023-01-01"),
            version("6.1.0", "2022-01-01"),
            version("6.0.0", "2021-01-01"),
        ]
    }

    #[test]
    fn test_distance_and_libyear() {
        let result = DependencyAnalyzer::new()
            .freshness("rails", "6.0.0", &history())
            .unwrap();

        assert_eq!(result.name, "rails");
        assert_eq!(result.current_version, "6.0.0");
        assert_eq!(result.latest_version.as_deref(), Some("7.0.0"));
        assert_eq!(result.version_distance, Some(2));
        assert_eq!(result.libyear_in_days, Some(730));
        assert_eq!(
            result.current_version_release_date,
            NaiveDate::from_ymd_opt(2021, 1, 1)
        );
        assert_eq!(
            result.latest_version_release_date,
            NaiveDate::from_ymd_opt(2023, 1, 1)
        );
        assert!(result.is_direct);
    }

    #[test]
    fn test_up_to_date_returns_none() {
        assert!(DependencyAnalyzer::new()
            .freshness("rails", "7.0.0", &history())
            .is_none());
        assert!(DependencyAnalyzer::new()
            .freshness("rails", "1.0.0", &[version("1.0.0", "2020-01-01")])
            .is_none());
    }

    #[test]
    fn test_unknown_installed_version_returns_none() {
        let analyzer = DependencyAnalyzer::new();
        assert!(analyzer.freshness("rails", "5.2.0", &history()).is_none());
        assert!(analyzer.freshness("rails", "not a version", &history()).is_none());
        assert!(analyzer.freshness("rails", "6.0.0", &[]).is_none());
    }

    #[test]
    fn test_equivalent_version_strings_match() {
        let result = DependencyAnalyzer::new()
            .freshness("rails", "6.0", &history())
            .unwrap();
        assert_eq!(result.current_version, "6.0");
        assert_eq!(result.version_distance, Some(2));
    }

    #[test]
    fn test_stable_install_skips_prereleases() {
        let versions = vec![
            version("7.1.0.rc1", "2023-06-01"),
            version("7.0.0", "2023-01-01"),
            version("6.1.0", "2022-01-01"),
        ];
        let result = DependencyAnalyzer::new()
            .freshness("rails", "6.1.0", &versions)
            .unwrap();

        assert_eq!(result.latest_version.as_deref(), Some("7.0.0"));
        assert_eq!(result.version_distance, Some(2));
        assert_eq!(result.libyear_in_days, Some(365));
    }

    #[test]
    fn test_stable_install_at_latest_stable_is_up_to_date() {
        let versions = vec![
            version("7.1.0.rc1", "2023-06-01"),
            version("7.0.0", "2023-01-01"),
        ];
        assert!(DependencyAnalyzer::new()
            .freshness("rails", "7.0.0", &versions)
            .is_none());
    }

    #[test]
    fn test_prerelease_install_compares_against_newest() {
        let versions = vec![
            version("7.1.0.rc2", "2023-07-01"),
            version("7.1.0.rc1", "2023-06-01"),
            version("7.0.0", "2023-01-01"),
        ];
        let result = DependencyAnalyzer::new()
            .freshness("rails", "7.1.0.rc1", &versions)
            .unwrap();

        assert_eq!(result.latest_version.as_deref(), Some("7.1.0.rc2"));
        assert_eq!(result.version_distance, Some(1));
        assert_eq!(result.libyear_in_days, Some(30));
    }

    #[test]
    fn test_negative_libyear_is_clamped() {
        let versions = vec![
            version("2.0.0", "2020-01-01"),
            version("1.0.0", "2021-01-01"),
        ];
        let result = DependencyAnalyzer::new()
            .freshness("rails", "1.0.0", &versions)
            .unwrap();

        assert_eq!(result.version_distance, Some(1));
        assert_eq!(result.libyear_in_days, Some(0));
    }
}
