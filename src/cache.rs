//! On-disk cache of registry version histories
//!
//! One JSON file per (host, gem) under
//! `<cache root>/<sanitized host>/<gem>.json`, holding the raw registry
//! records. The file's modification time is the only expiry signal.
//!
//! Hosts that differ only in non-alphanumeric characters
//! (`gems.example.com` and `gems-example.com`) share a directory. Gem
//! names outside `[A-Za-z0-9._-]` are never cached, so a lockfile entry
//! cannot name a path outside the cache root.

use crate::error::CacheError;
use crate::registry::RawGemVersion;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Entries older than this are refetched
pub const CACHE_EXPIRATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Version history cache keyed by registry host and gem name
#[derive(Debug, Clone)]
pub struct VersionCache {
    root: PathBuf,
    enabled: bool,
    ttl: Duration,
}

impl VersionCache {
    /// Cache rooted at `root` with the default 24 hour expiry
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            enabled: true,
            ttl: CACHE_EXPIRATION,
        }
    }

    /// A cache that never reads or writes
    pub fn disabled() -> Self {
        Self {
            root: PathBuf::new(),
            enabled: false,
            ttl: CACHE_EXPIRATION,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Return the cached history for (host, gem), or produce and store it
    ///
    /// An empty result from `producer` is returned but not stored, so a
    /// failed lookup is retried on the next run.
    pub async fn with_cache<F, Fut>(
        &self,
        host: &str,
        gem: &str,
        producer: F,
    ) -> Vec<RawGemVersion>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Vec<RawGemVersion>>,
    {
        if !self.is_enabled() {
            return producer().await;
        }

        let Some(path) = self.entry_path(host, gem) else {
            warn!("Not caching {}: name is not a valid gem name", gem);
            return producer().await;
        };
        if self.is_fresh(&path) {
            match read_entry(&path) {
                Ok(versions) => {
                    debug!(host, gem, "cache hit");
                    return versions;
                }
                Err(e) => warn!("Ignoring cache entry: {}", e),
            }
        }

        debug!(host, gem, "cache miss");
        let versions = producer().await;
        if versions.is_empty() {
            return versions;
        }

        if let Err(e) = write_entry(&path, &versions) {
            warn!("Could not write cache entry: {}", e);
        }
        versions
    }

    /// Path of the cache file for (host, gem), None for unsafe gem names
    pub fn entry_path(&self, host: &str, gem: &str) -> Option<PathBuf> {
        is_cacheable_name(gem)
            .then(|| self.root.join(host_key(host)).join(format!("{}.json", gem)))
    }

    fn is_fresh(&self, path: &Path) -> bool {
        let Ok(modified) = fs::metadata(path).and_then(|meta| meta.modified()) else {
            return false;
        };
        // An mtime in the future counts as age zero
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        age < self.ttl
    }
}

/// Replace every non-alphanumeric character so the host is a safe directory name
pub fn host_key(host: &str) -> String {
    host.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn is_cacheable_name(gem: &str) -> bool {
    !gem.is_empty()
        && gem != "."
        && gem != ".."
        && gem
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

fn read_entry(path: &Path) -> Result<Vec<RawGemVersion>, CacheError> {
    let content = fs::read_to_string(path).map_err(|e| CacheError::read_error(path, e))?;
    serde_json::from_str(&content).map_err(|e| CacheError::corrupt(path, e.to_string()))
}

fn write_entry(path: &Path, versions: &[RawGemVersion]) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| CacheError::write_error(parent, e))?;
    }

    let json = serde_json::to_string(versions)
        .map_err(|e| CacheError::write_error(path, std::io::Error::other(e)))?;
    fs::write(path, json).map_err(|e| CacheError::write_error(path, e))?;

    let file = fs::File::options()
        .write(true)
        .open(path)
        .map_err(|e| CacheError::write_error(path, e))?;
    file.set_modified(SystemTime::now())
        .map_err(|e| CacheError::write_error(path, e))
}
