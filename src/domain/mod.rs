//! Core domain models for libyear
//!
//! This module contains the fundamental types used throughout the application:
//! - Lockfile structure (sources, specs, dependencies, platforms)
//! - Gem version numbers with RubyGems ordering
//! - Per-gem freshness results

mod freshness;
mod lockfile;
mod version;

pub use freshness::{total_libyears, total_version_distance, DependencyFreshness, DAYS_PER_YEAR};
pub use lockfile::{Dependency, Lockfile, Platform, RubyVersion, Source, SourceKind, Spec};
pub use version::{GemVersion, InvalidVersion, VersionNumber};
