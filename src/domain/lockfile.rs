//! Lockfile data model
//!
//! Structured form of a Bundler lockfile as produced by
//! [`LockfileParser`](crate::parser::LockfileParser). All values are plain
//! owned data and are never mutated after a parse.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

/// Platform suffix on a locked version, e.g. `1.15.0-x86_64-linux`
static PLATFORM_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(.+?)-((?:x86|x64|arm|aarch64|universal|java|jruby|mingw|mswin|darwin|linux|ruby)[-\w.]*|[^-]*_[-\w.]*)$",
    )
    .unwrap()
});

/// A fully parsed lockfile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lockfile {
    /// Package sources (GIT, GEM, PATH, PLUGIN SOURCE) in file order
    pub sources: Vec<Source>,
    /// Entries of the PLATFORMS section
    pub platforms: Vec<Platform>,
    /// Top-level entries of the DEPENDENCIES section
    pub dependencies: Vec<Dependency>,
    /// RUBY VERSION section, if present
    pub ruby_version: Option<RubyVersion>,
    /// BUNDLED WITH section, if present
    pub bundled_with: Option<String>,
}

impl Lockfile {
    /// Iterates over the sources that can be resolved against a gem registry
    pub fn registry_sources(&self) -> impl Iterator<Item = &Source> {
        self.sources.iter().filter(|s| s.is_fetchable())
    }

    /// Total number of locked specs across all sources
    pub fn spec_count(&self) -> usize {
        self.sources.iter().map(|s| s.specs.len()).sum()
    }
}

/// Kind of a lockfile source section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// `GIT` section
    Git,
    /// `GEM` section (a gem registry)
    Registry,
    /// `PATH` section
    Path,
    /// `PLUGIN SOURCE` section
    Plugin,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SourceKind::Git => "git",
            SourceKind::Registry => "gem",
            SourceKind::Path => "path",
            SourceKind::Plugin => "plugin",
        };
        write!(f, "{}", label)
    }
}

/// A source section and the specs locked from it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub kind: SourceKind,
    /// `remote:` value (registry or VCS URL)
    pub remote: Option<String>,
    /// `revision:` value (git sources)
    pub revision: Option<String>,
    pub specs: Vec<Spec>,
    /// Any other `key: value` lines (branch, tag, glob, ...)
    pub options: BTreeMap<String, String>,
}

impl Source {
    /// Creates an empty source of the given kind
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            remote: None,
            revision: None,
            specs: Vec::new(),
            options: BTreeMap::new(),
        }
    }

    /// A registry source without a remote cannot be fetched and is skipped
    pub fn is_fetchable(&self) -> bool {
        self.kind == SourceKind::Registry && self.remote.is_some()
    }
}

/// A locked package under a source's `specs:` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spec {
    pub name: String,
    /// Locked version exactly as printed (may carry a platform suffix)
    pub version: String,
    /// Sub-dependencies declared under this lockfile entry
    pub dependencies: Vec<Dependency>,
}

impl Spec {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            dependencies: Vec::new(),
        }
    }

    /// The locked version without a trailing platform suffix
    ///
    /// `1.15.0-x86_64-linux` becomes `1.15.0`; `7.0.0` and prerelease
    /// forms like `2.0.0-beta` are returned unchanged.
    pub fn release_version(&self) -> &str {
        PLATFORM_SUFFIX_RE
            .captures(&self.version)
            .and_then(|caps| caps.get(1))
            .map_or(self.version.as_str(), |m| m.as_str())
    }
}

/// A named dependency with an optional, uninterpreted requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    /// Constraint text inside the parentheses, e.g. `~> 7.0`
    pub version_requirements: Option<String>,
}

impl Dependency {
    pub fn new(name: impl Into<String>, version_requirements: Option<String>) -> Self {
        Self {
            name: name.into(),
            version_requirements,
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version_requirements {
            Some(req) => write!(f, "{} ({})", self.name, req),
            None => write!(f, "{}", self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub name: String,
}

/// Contents of the RUBY VERSION section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubyVersion {
    pub version: String,
    pub engine: Option<String>,
    pub patchlevel: Option<String>,
}
