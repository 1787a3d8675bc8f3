//! Version history lookup for one gem on one host
//!
//! Combines the per-host client pool, the per-host rate limiter and the
//! on-disk cache. Lookups never fail: anything that goes wrong yields an
//! empty history and a diagnostic. Transient failures are retried with
//! exponential backoff, and every attempt waits for its own rate-limit
//! slot.

use crate::cache::VersionCache;
use crate::config::Config;
use crate::domain::{GemVersion, VersionNumber};
use crate::error::RegistryError;
use crate::registry::{
    ClientFactory, ClientPool, GemRegistry, HttpClient, RateLimiter, RawGemVersion,
    RubyGemsFactory,
};
use chrono::{DateTime, NaiveDate};
use reqwest::Url;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, warn};

/// Maximum number of retries after the first attempt
pub const MAX_RETRIES: u32 = 3;

/// Backoff before the first retry, doubled for each further one
const BASE_DELAY: Duration = Duration::from_millis(100);

type RegistryPool = ClientPool<Arc<dyn GemRegistry>>;

pub struct GemInfoFetcher {
    factory: Arc<dyn ClientFactory>,
    /// Source URL per host
    sources: RwLock<HashMap<String, Url>>,
    /// Client pool per host, created on first use
    pools: Mutex<HashMap<String, Arc<RegistryPool>>>,
    rate_limiter: RateLimiter,
    cache: VersionCache,
    pool_size: usize,
    max_retries: u32,
}

impl GemInfoFetcher {
    pub fn new(factory: Arc<dyn ClientFactory>, cache: VersionCache) -> Self {
        Self {
            factory,
            sources: RwLock::new(HashMap::new()),
            pools: Mutex::new(HashMap::new()),
            rate_limiter: RateLimiter::default(),
            cache,
            pool_size: crate::config::DEFAULT_POOL_SIZE,
            max_retries: MAX_RETRIES,
        }
    }

    /// Build a fetcher talking to RubyGems-compatible servers
    pub fn from_config(config: &Config) -> Result<Self, RegistryError> {
        let factory = Arc::new(RubyGemsFactory::new(HttpClient::new()?));
        let cache = if config.use_cache {
            VersionCache::new(&config.cache_dir)
        } else {
            VersionCache::disabled()
        };

        let fetcher = Self::new(factory, cache)
            .with_pool_size(config.pool_size)
            .with_rate_limiter(RateLimiter::new(config.requests_per_second));
        for source in &config.sources {
            fetcher.register_source(source);
        }
        Ok(fetcher)
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Make `source` the registry for its host unless one is already known
    ///
    /// Returns false when the host was already configured or the URL has no host.
    pub fn register_source(&self, source: &Url) -> bool {
        let Some(host) = source.host_str() else {
            return false;
        };

        let mut sources = self.sources.write().unwrap_or_else(PoisonError::into_inner);
        if sources.contains_key(host) {
            return false;
        }
        sources.insert(host.to_string(), source.clone());
        true
    }

    pub fn has_source(&self, host: &str) -> bool {
        self.sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(host)
    }

    /// The client pool for `host`, or None when no source serves it
    fn pool_for(&self, host: &str) -> Option<Arc<RegistryPool>> {
        let source = self
            .sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(host)
            .cloned()?;

        let mut pools = self.pools.lock().unwrap_or_else(PoisonError::into_inner);
        let pool = pools.entry(host.to_string()).or_insert_with(|| {
            let factory = Arc::clone(&self.factory);
            Arc::new(ClientPool::new(self.pool_size, move || {
                factory.create(&source)
            }))
        });
        Some(Arc::clone(pool))
    }

    /// Every published version of `gem` on `host`, in registry order
    pub async fn versions_for(&self, gem: &str, host: &str) -> Vec<GemVersion> {
        let Some(pool) = self.pool_for(host) else {
            warn!("No configured source for host {}; skipping {}", host, gem);
            return Vec::new();
        };

        let raw = self
            .cache
            .with_cache(host, gem, || async {
                let client = pool.get().await;
                match self.fetch_with_retries(&client, gem, host).await {
                    Ok(versions) => versions,
                    Err(e) if e.is_not_found() => {
                        warn!("{}", e);
                        Vec::new()
                    }
                    Err(e) => {
                        warn!("Failed to fetch versions: {}", e);
                        Vec::new()
                    }
                }
            })
            .await;

        to_gem_versions(gem, raw)
    }

    async fn fetch_with_retries(
        &self,
        client: &Arc<dyn GemRegistry>,
        gem: &str,
        host: &str,
    ) -> Result<Vec<RawGemVersion>, RegistryError> {
        let mut delay = BASE_DELAY;
        let mut attempt = 0;

        loop {
            self.rate_limiter.wait_for_slot(host).await;
            match client.fetch_versions(gem).await {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    debug!(gem, host, attempt, "retrying after: {}", e);
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                result => return result,
            }
        }
    }
}

/// Parse raw records, dropping unparseable ones and collapsing platform builds
fn to_gem_versions(gem: &str, raw: Vec<RawGemVersion>) -> Vec<GemVersion> {
    let mut versions: Vec<GemVersion> = Vec::with_capacity(raw.len());
    let mut seen: HashMap<VersionNumber, usize> = HashMap::new();

    for record in raw {
        let number = match VersionNumber::parse(&record.number) {
            Ok(number) => number,
            Err(e) => {
                debug!(gem, "dropping record: {}", e);
                continue;
            }
        };
        let Some(created_at) = parse_created_at(&record.created_at) else {
            debug!(gem, created_at = %record.created_at, "dropping record with bad timestamp");
            continue;
        };
        let prerelease = record.prerelease.unwrap_or(false) || number.is_prerelease();

        match seen.get(&number) {
            Some(&idx) => {
                let existing = &mut versions[idx];
                existing.created_at = existing.created_at.min(created_at);
            }
            None => {
                seen.insert(number.clone(), versions.len());
                versions.push(GemVersion::new(gem, number, created_at, prerelease));
            }
        }
    }

    versions
}

/// Registry timestamps are RFC 3339; plain dates are accepted too
fn parse_created_at(value: &str) -> Option<NaiveDate> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.date_naive());
    }
    value
        .get(..10)
        .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
}
