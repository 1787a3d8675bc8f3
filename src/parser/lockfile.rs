//! Bundler lockfile parser
//!
//! Single forward pass over the lines of a `Gemfile.lock`. Top-level
//! section headers select a sub-parser; every sub-parser returns the
//! index of the first line it did not consume. Unknown lines are skipped,
//! so parsing never fails.
//!
//! ```text
//! GEM
//!   remote: https://rubygems.org/
//!   specs:
//!     rails (7.0.0)
//!       activesupport (= 7.0.0)
//!
//! PLATFORMS
//!   ruby
//!
//! DEPENDENCIES
//!   rails (~> 7.0)
//!
//! RUBY VERSION
//!    ruby 3.2.2p53
//!
//! BUNDLED WITH
//!    2.4.10
//! ```

use crate::domain::{Dependency, Lockfile, Platform, RubyVersion, Source, SourceKind, Spec};
use regex::Regex;
use std::sync::LazyLock;

// Source body lines
static REMOTE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^  remote: (.+)$").unwrap());
static REVISION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^  revision: (.+)$").unwrap());
static SPECS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^  specs:$").unwrap());
static OPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^  ([a-zA-Z]+): (.+)$").unwrap());

// `    name (version)` under specs:, `      name (requirement)` below a spec
static SPEC_ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^    ([^ (]+)(?: \(([^)]+)\))?$").unwrap());
static SPEC_DEPENDENCY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^      ([^ (]+)(?: \(([^)]+)\))?$").unwrap());

// `  name (requirement)!` under DEPENDENCIES; `!` marks a non-registry source
static TOP_LEVEL_DEPENDENCY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^  ([^ (!]+)(?: \(([^)]+)\))?(!)?$").unwrap());

static PLATFORM_ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^  (.+)$").unwrap());

// RUBY VERSION and BUNDLED WITH bodies are indented by two or three spaces
static VERSION_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^   ?([^ ].+)$").unwrap());

/// Top-level section headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Source(SourceKind),
    Platforms,
    Dependencies,
    RubyVersion,
    BundledWith,
    Checksums,
}

impl Section {
    fn from_line(line: &str) -> Option<Self> {
        match line {
            "GIT" => Some(Section::Source(SourceKind::Git)),
            "GEM" => Some(Section::Source(SourceKind::Registry)),
            "PATH" => Some(Section::Source(SourceKind::Path)),
            "PLUGIN SOURCE" => Some(Section::Source(SourceKind::Plugin)),
            "PLATFORMS" => Some(Section::Platforms),
            "DEPENDENCIES" => Some(Section::Dependencies),
            "RUBY VERSION" => Some(Section::RubyVersion),
            "BUNDLED WITH" => Some(Section::BundledWith),
            "CHECKSUMS" => Some(Section::Checksums),
            _ => None,
        }
    }
}

fn is_section_header(line: &str) -> bool {
    Section::from_line(line).is_some()
}

/// Parser for `Gemfile.lock` contents
#[derive(Debug, Clone, Copy, Default)]
pub struct LockfileParser;

impl LockfileParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse lockfile text. Never fails; unrecognised lines are ignored.
    pub fn parse(&self, content: &str) -> Lockfile {
        let lines: Vec<&str> = content.lines().collect();
        let mut lockfile = Lockfile::default();

        let mut i = 0;
        while i < lines.len() {
            i = match Section::from_line(lines[i]) {
                Some(Section::Source(kind)) => {
                    let (source, next) = parse_source(&lines, kind, i + 1);
                    lockfile.sources.push(source);
                    next
                }
                Some(Section::Platforms) => {
                    let (platforms, next) = parse_platforms(&lines, i + 1);
                    lockfile.platforms = platforms;
                    next
                }
                Some(Section::Dependencies) => {
                    let (dependencies, next) = parse_dependencies(&lines, i + 1);
                    lockfile.dependencies = dependencies;
                    next
                }
                Some(Section::RubyVersion) => {
                    let (ruby_version, next) = parse_ruby_version(&lines, i + 1);
                    lockfile.ruby_version = ruby_version;
                    next
                }
                Some(Section::BundledWith) => {
                    let (bundled_with, next) = parse_version_line(&lines, i + 1);
                    lockfile.bundled_with = bundled_with;
                    next
                }
                Some(Section::Checksums) => skip_section(&lines, i + 1),
                None => i + 1,
            };
        }

        lockfile
    }
}

/// Consume a source body up to the next section header
fn parse_source(lines: &[&str], kind: SourceKind, start: usize) -> (Source, usize) {
    let mut source = Source::new(kind);
    let mut i = start;

    while i < lines.len() && !is_section_header(lines[i]) {
        let line = lines[i];

        if let Some(caps) = REMOTE_RE.captures(line) {
            source.remote = Some(caps[1].to_string());
        } else if let Some(caps) = REVISION_RE.captures(line) {
            source.revision = Some(caps[1].to_string());
        } else if SPECS_RE.is_match(line) {
            let (specs, next) = parse_specs(lines, i + 1);
            source.specs = specs;
            i = next;
            continue;
        } else if let Some(caps) = OPTION_RE.captures(line) {
            source.options.insert(caps[1].to_string(), caps[2].to_string());
        }

        i += 1;
    }

    (source, i)
}

/// Consume spec lines and their nested dependency lines
fn parse_specs(lines: &[&str], start: usize) -> (Vec<Spec>, usize) {
    let mut specs = Vec::new();
    let mut i = start;

    while let Some(caps) = lines.get(i).and_then(|line| SPEC_ENTRY_RE.captures(line)) {
        let mut spec = Spec::new(
            &caps[1],
            caps.get(2).map_or("", |m| m.as_str()),
        );
        i += 1;

        while let Some(dep) = lines.get(i).and_then(|line| SPEC_DEPENDENCY_RE.captures(line)) {
            spec.dependencies.push(Dependency::new(
                &dep[1],
                dep.get(2).map(|m| m.as_str().to_string()),
            ));
            i += 1;
        }

        specs.push(spec);
    }

    (specs, i)
}

fn parse_platforms(lines: &[&str], start: usize) -> (Vec<Platform>, usize) {
    let mut platforms = Vec::new();
    let mut i = start;

    while i < lines.len() && !is_section_header(lines[i]) {
        let Some(caps) = PLATFORM_ENTRY_RE.captures(lines[i]) else {
            break;
        };
        platforms.push(Platform {
            name: caps[1].trim().to_string(),
        });
        i += 1;
    }

    (platforms, i)
}

fn parse_dependencies(lines: &[&str], start: usize) -> (Vec<Dependency>, usize) {
    let mut dependencies = Vec::new();
    let mut i = start;

    while let Some(caps) = lines
        .get(i)
        .and_then(|line| TOP_LEVEL_DEPENDENCY_RE.captures(line))
    {
        dependencies.push(Dependency::new(
            &caps[1],
            caps.get(2).map(|m| m.as_str().to_string()),
        ));
        i += 1;
    }

    (dependencies, i)
}

/// `ruby 3.4.6p0`, `ruby 2.6.8p205 (jruby 9.3.0.0)` or `ruby 3.3.0`
fn parse_ruby_version(lines: &[&str], start: usize) -> (Option<RubyVersion>, usize) {
    let (Some(line), next) = parse_version_line(lines, start) else {
        return (None, start);
    };

    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some(version_part) = parts.get(1) else {
        return (None, next);
    };

    let (version, patchlevel) = match version_part.split_once('p') {
        Some((version, patchlevel)) => (version, Some(patchlevel.to_string())),
        None => (*version_part, None),
    };
    let engine = parts
        .get(2)
        .map(|engine| engine.trim_start_matches('(').to_string());

    let ruby_version = RubyVersion {
        version: version.to_string(),
        engine,
        patchlevel,
    };

    (Some(ruby_version), next)
}

/// Consume exactly one indented value line
fn parse_version_line(lines: &[&str], start: usize) -> (Option<String>, usize) {
    match lines.get(start).and_then(|line| VERSION_LINE_RE.captures(line)) {
        Some(caps) => (Some(caps[1].trim_end().to_string()), start + 1),
        None => (None, start),
    }
}

fn skip_section(lines: &[&str], start: usize) -> usize {
    let mut i = start;
    while i < lines.len() && !is_section_header(lines[i]) {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Lockfile {
        LockfileParser::new().parse(content)
    }

    const BASIC: &str = "GEM
  remote: https://rubygems.org/
  specs:
    rails (7.0.0)
      activesupport (= 7.0.0)
      railties (= 7.0.0)
    rake (13.0.0)

PLATFORMS
  ruby
  x86_64-linux

DEPENDENCIES
  rails (~> 7.0)
  rake (>= 13.0)

RUBY VERSION
   ruby 3.4.6p0

BUNDLED WITH
   2.6.2
";

    #[test]
    fn test_parse_empty() {
        let lockfile = parse("");
        assert!(lockfile.sources.is_empty());
        assert!(lockfile.platforms.is_empty());
        assert!(lockfile.dependencies.is_empty());
        assert!(lockfile.ruby_version.is_none());
        assert!(lockfile.bundled_with.is_none());
    }

    #[test]
    fn test_parse_gem_source_with_remote() {
        let lockfile = parse(BASIC);
        assert_eq!(lockfile.sources.len(), 1);
        let source = &lockfile.sources[0];
        assert_eq!(source.kind, SourceKind::Registry);
        assert_eq!(source.remote.as_deref(), Some("https://rubygems.org/"));
    }

    #[test]
    fn test_parse_specs_with_versions() {
        let specs = &parse(BASIC).sources[0].specs;
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "rails");
        assert_eq!(specs[0].version, "7.0.0");
        assert_eq!(specs[1].name, "rake");
        assert_eq!(specs[1].version, "13.0.0");
    }

    #[test]
    fn test_parse_spec_dependencies() {
        let rails = &parse(BASIC).sources[0].specs[0];
        assert_eq!(rails.dependencies.len(), 2);
        assert_eq!(rails.dependencies[0].name, "activesupport");
        assert_eq!(
            rails.dependencies[0].version_requirements.as_deref(),
            Some("= 7.0.0")
        );
        assert_eq!(rails.dependencies[1].name, "railties");
    }

    #[test]
    fn test_parse_platforms() {
        let lockfile = parse(BASIC);
        let names: Vec<&str> = lockfile.platforms.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["ruby", "x86_64-linux"]);
    }

    #[test]
    fn test_parse_dependencies() {
        let lockfile = parse(BASIC);
        assert_eq!(lockfile.dependencies.len(), 2);
        assert_eq!(lockfile.dependencies[0].name, "rails");
        assert_eq!(
            lockfile.dependencies[0].version_requirements.as_deref(),
            Some("~> 7.0")
        );
        assert_eq!(
            lockfile.dependencies[1].version_requirements.as_deref(),
            Some(">= 13.0")
        );
    }

    #[test]
    fn test_parse_ruby_version() {
        let ruby = parse(BASIC).ruby_version.unwrap();
        assert_eq!(ruby.version, "3.4.6");
        assert_eq!(ruby.patchlevel.as_deref(), Some("0"));
        assert!(ruby.engine.is_none());
    }

    #[test]
    fn test_parse_ruby_version_with_engine() {
        let lockfile = parse("RUBY VERSION\n   ruby 2.6.8p205 (jruby 9.3.0.0)\n");
        let ruby = lockfile.ruby_version.unwrap();
        assert_eq!(ruby.version, "2.6.8");
        assert_eq!(ruby.patchlevel.as_deref(), Some("205"));
        assert_eq!(ruby.engine.as_deref(), Some("jruby"));
    }

    #[test]
    fn test_parse_ruby_version_without_patchlevel() {
        let ruby = parse("RUBY VERSION\n   ruby 3.3.0\n").ruby_version.unwrap();
        assert_eq!(ruby.version, "3.3.0");
        assert!(ruby.patchlevel.is_none());
    }

    #[test]
    fn test_parse_bundled_with() {
        assert_eq!(parse(BASIC).bundled_with.as_deref(), Some("2.6.2"));
    }

    #[test]
    fn test_parse_git_source() {
        let lockfile = parse(
            "GIT
  remote: https://github.com/rails/rails.git
  revision: abc123def456
  branch: main
  specs:
    rails (7.1.0.alpha)

DEPENDENCIES
  rails!
",
        );

        let git = &lockfile.sources[0];
        assert_eq!(git.kind, SourceKind::Git);
        assert_eq!(git.remote.as_deref(), Some("https://github.com/rails/rails.git"));
        assert_eq!(git.revision.as_deref(), Some("abc123def456"));
        assert_eq!(git.options.get("branch").map(String::as_str), Some("main"));
        assert_eq!(git.specs.len(), 1);
        assert_eq!(git.specs[0].name, "rails");

        assert_eq!(lockfile.dependencies.len(), 1);
        assert_eq!(lockfile.dependencies[0].name, "rails");
        assert!(lockfile.dependencies[0].version_requirements.is_none());
    }

    #[test]
    fn test_pinned_dependency_with_requirement() {
        let lockfile = parse("DEPENDENCIES\n  rails (~> 7.1)!\n  rake\n");
        assert_eq!(lockfile.dependencies.len(), 2);
        assert_eq!(lockfile.dependencies[0].name, "rails");
        assert_eq!(
            lockfile.dependencies[0].version_requirements.as_deref(),
            Some("~> 7.1")
        );
        assert_eq!(lockfile.dependencies[1].name, "rake");
    }

    #[test]
    fn test_multiple_sources() {
        let lockfile = parse(
            "PATH
  remote: .
  specs:
    mygem (0.1.0)
      rake

GEM
  remote: https://rubygems.org/
  specs:
    rake (13.0.0)

PLUGIN SOURCE
  remote: https://example.com/plugin
  type: custom
  specs:
",
        );

        let kinds: Vec<SourceKind> = lockfile.sources.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![SourceKind::Path, SourceKind::Registry, SourceKind::Plugin]
        );
        assert_eq!(lockfile.sources[0].specs[0].dependencies[0].name, "rake");
        assert!(lockfile.sources[0].specs[0].dependencies[0]
            .version_requirements
            .is_none());
        assert_eq!(
            lockfile.sources[2].options.get("type").map(String::as_str),
            Some("custom")
        );
        assert!(lockfile.sources[2].specs.is_empty());
    }

    #[test]
    fn test_checksums_section_is_skipped() {
        let lockfile = parse(
            "GEM
  remote: https://rubygems.org/
  specs:
    rake (13.0.0)

CHECKSUMS
  rake (13.0.0) sha256=abcdef

BUNDLED WITH
   2.5.0
",
        );
        assert_eq!(lockfile.sources[0].specs.len(), 1);
        assert_eq!(lockfile.bundled_with.as_deref(), Some("2.5.0"));
    }

    #[test]
    fn test_gem_source_without_remote() {
        let lockfile = parse("GEM\n  specs:\n    rake (13.0.0)\n");
        assert_eq!(lockfile.sources.len(), 1);
        assert!(lockfile.sources[0].remote.is_none());
        assert!(!lockfile.sources[0].is_fetchable());
    }

    #[test]
    fn test_platform_specific_spec() {
        let lockfile = parse(
            "GEM
  remote: https://rubygems.org/
  specs:
    nokogiri (1.15.0-x86_64-linux)
      racc (~> 1.4)
",
        );
        let spec = &lockfile.sources[0].specs[0];
        assert_eq!(spec.version, "1.15.0-x86_64-linux");
        assert_eq!(spec.release_version(), "1.15.0");
    }

    #[test]
    fn test_unrecognized_lines_are_ignored() {
        let lockfile = parse("garbage\n\n  more garbage\nBUNDLED WITH\n   2.4.0\n");
        assert!(lockfile.sources.is_empty());
        assert_eq!(lockfile.bundled_with.as_deref(), Some("2.4.0"));
    }

    #[test]
    fn test_headers_without_bodies_terminate() {
        let lockfile =
            parse("GEM\nPLATFORMS\nDEPENDENCIES\nRUBY VERSION\nBUNDLED WITH\nCHECKSUMS\nGIT");
        assert_eq!(lockfile.sources.len(), 2);
        assert!(lockfile.platforms.is_empty());
        assert!(lockfile.ruby_version.is_none());
        assert!(lockfile.bundled_with.is_none());
    }

    #[test]
    fn test_windows_line_endings() {
        let lockfile = parse("GEM\r\n  remote: https://rubygems.org/\r\n  specs:\r\n    rake (13.0.0)\r\n");
        assert_eq!(lockfile.sources[0].specs[0].version, "13.0.0");
    }
}
