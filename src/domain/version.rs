//! Gem version numbers and registry version records
//!
//! RubyGems versions are not SemVer: `7.0.0.rc1`, `1.2.3.4` and `2.0` are
//! all valid. [`VersionNumber`] implements the RubyGems ordering:
//! - segments are runs of digits or runs of letters
//! - any letter segment makes the version a prerelease
//! - trailing zeros are insignificant (`1.0 == 1.0.0`)
//! - a letter segment sorts below a numeric one (`1.0.a < 1.0.0`)

use chrono::NaiveDate;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([0-9]+(?:\.[0-9a-zA-Z]+)*(?:-[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?)\s*$")
        .unwrap()
});

static SEGMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+|[a-zA-Z]+").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Segment {
    /// Decimal digits without leading zeros, `"0"` for zero; any length
    Numeric(String),
    Text(String),
}

impl Segment {
    fn numeric(digits: &str) -> Self {
        let trimmed = digits.trim_start_matches('0');
        Segment::Numeric(if trimmed.is_empty() { "0" } else { trimmed }.to_string())
    }

    fn is_zero(&self) -> bool {
        matches!(self, Segment::Numeric(digits) if digits == "0")
    }

    fn compare(&self, other: &Segment) -> Ordering {
        match (self, other) {
            (Segment::Numeric(a), Segment::Numeric(b)) => {
                a.len().cmp(&b.len()).then_with(|| a.cmp(b))
            }
            (Segment::Text(a), Segment::Text(b)) => a.cmp(b),
            (Segment::Text(_), Segment::Numeric(_)) => Ordering::Less,
            (Segment::Numeric(_), Segment::Text(_)) => Ordering::Greater,
        }
    }
}

/// A comparable gem version number
#[derive(Debug, Clone)]
pub struct VersionNumber {
    raw: String,
    /// Segments with insignificant trailing zeros removed
    canonical: Vec<Segment>,
    prerelease: bool,
}

/// Error returned when a string is not a valid gem version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidVersion(pub String);

impl fmt::Display for InvalidVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed version number string {}", self.0)
    }
}

impl std::error::Error for InvalidVersion {}

impl VersionNumber {
    /// Parse a gem version string
    pub fn parse(input: &str) -> Result<Self, InvalidVersion> {
        let caps = VERSION_RE
            .captures(input)
            .ok_or_else(|| InvalidVersion(input.to_string()))?;
        let version = caps
            .get(1)
            .ok_or_else(|| InvalidVersion(input.to_string()))?
            .as_str();

        let normalized = version.replace('-', ".pre.");
        let segments: Vec<Segment> = SEGMENT_RE
            .find_iter(&normalized)
            .map(|m| {
                let segment = m.as_str();
                if segment.starts_with(|c: char| c.is_ascii_digit()) {
                    Segment::numeric(segment)
                } else {
                    Segment::Text(segment.to_string())
                }
            })
            .collect();

        let prerelease = segments.iter().any(|s| matches!(s, Segment::Text(_)));

        Ok(Self {
            raw: version.to_string(),
            canonical: canonicalize(segments),
            prerelease,
        })
    }

    /// True when the version has any letter segment (`1.0.0.rc1`, `2.0.0-beta`)
    pub fn is_prerelease(&self) -> bool {
        self.prerelease
    }

    /// The version exactly as it was written
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Drop trailing zeros from the numeric part and from the text part
fn canonicalize(segments: Vec<Segment>) -> Vec<Segment> {
    let split = segments
        .iter()
        .position(|s| matches!(s, Segment::Text(_)))
        .unwrap_or(segments.len());
    let (numeric, text) = segments.split_at(split);

    let trim = |part: &[Segment]| -> Vec<Segment> {
        let end = part
            .iter()
            .rposition(|s| !s.is_zero())
            .map_or(0, |idx| idx + 1);
        part[..end].to_vec()
    };

    let mut canonical = trim(numeric);
    canonical.extend(trim(text));
    canonical
}

impl Ord for VersionNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.canonical.len().max(other.canonical.len());
        let zero = Segment::numeric("0");

        for idx in 0..len {
            let lhs = self.canonical.get(idx).unwrap_or(&zero);
            let rhs = other.canonical.get(idx).unwrap_or(&zero);
            match lhs.compare(rhs) {
                Ordering::Equal => continue,
                ordering => return ordering,
            }
        }

        Ordering::Equal
    }
}

impl PartialOrd for VersionNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for VersionNumber {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionNumber {}

impl Hash for VersionNumber {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl FromStr for VersionNumber {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl Serialize for VersionNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// One published version of a gem, parsed from registry metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GemVersion {
    pub name: String,
    pub number: VersionNumber,
    pub created_at: NaiveDate,
    pub prerelease: bool,
}

impl GemVersion {
    pub fn new(
        name: impl Into<String>,
        number: VersionNumber,
        created_at: NaiveDate,
        prerelease: bool,
    ) -> Self {
        Self {
            name: name.into(),
            number,
            created_at,
            prerelease,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> VersionNumber {
        VersionNumber::parse(s).unwrap()
    }

    #[test]
    fn test_parse_simple() {
        let version = v("7.0.0");
        assert_eq!(version.as_str(), "7.0.0");
        assert!(!version.is_prerelease());
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(v("  1.2.3 ").as_str(), "1.2.3");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(VersionNumber::parse("").is_err());
        assert!(VersionNumber::parse("abc").is_err());
        assert!(VersionNumber::parse("1.0.0-x86_64-linux").is_err());
        assert!(VersionNumber::parse("1..0").is_err());
    }

    #[test]
    fn test_prerelease_detection() {
        assert!(v("7.0.0.rc1").is_prerelease());
        assert!(v("2.0.0-beta").is_prerelease());
        assert!(v("1.0.a").is_prerelease());
        assert!(!v("1.2.3.4").is_prerelease());
    }

    #[test]
    fn test_ordering_numeric() {
        assert!(v("1.9.0") < v("1.10.0"));
        assert!(v("10.0.0") > v("9.9.9"));
        assert!(v("1.2.3.4") > v("1.2.3"));
    }

    #[test]
    fn test_long_numeric_segments_stay_numeric() {
        let dated = v("1.20240101123456789012");
        assert!(!dated.is_prerelease());
        assert!(dated > v("1.9"));
        assert!(dated < v("1.30240101123456789012"));
        assert!(v("99999999999999999999999") > v("99999999999999999999998"));
        assert!(v("99999999999999999999999.rc1") < v("99999999999999999999999"));
    }

    #[test]
    fn test_leading_zeros_are_insignificant() {
        assert_eq!(v("1.01"), v("1.1"));
        assert_eq!(v("1.00"), v("1"));
        assert!(v("1.010") > v("1.9"));
    }

    #[test]
    fn test_trailing_zeros_are_equal() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert_eq!(v("1"), v("1.0.0.0"));
    }

    #[test]
    fn test_prerelease_sorts_before_release() {
        assert!(v("7.0.0.rc1") < v("7.0.0"));
        assert!(v("7.0.0.alpha") < v("7.0.0.beta"));
        assert!(v("7.0.0.rc1") > v("6.1.0"));
        assert!(v("1.0.0.rc1") < v("1.0.0.rc2"));
    }

    #[test]
    fn test_dash_prerelease() {
        assert_eq!(v("2.0.0-beta"), v("2.0.0.pre.beta"));
        assert!(v("2.0.0-beta") < v("2.0.0"));
    }

    #[test]
    fn test_display_keeps_original() {
        assert_eq!(v("1.0").to_string(), "1.0");
    }

    #[test]
    fn test_sort_newest_first() {
        let mut versions = vec![v("6.0.0"), v("7.0.0"), v("7.0.0.rc1"), v("6.1.0")];
        versions.sort_by(|a, b| b.cmp(a));
        let ordered: Vec<&str> = versions.iter().map(|v| v.as_str()).collect();
        assert_eq!(ordered, vec!["7.0.0", "7.0.0.rc1", "6.1.0", "6.0.0"]);
    }
}
