//! Analysis pipeline: lockfile text in, freshness results out
//!
//! Specs are grouped by registry host. Every host gets its own task and
//! hosts run in parallel; within a host at most `host_concurrency` specs
//! are in flight at once, so the host's rate limit and pool stay
//! meaningful. A failure for one spec only removes that spec from the
//! results.

use crate::analyzer::{DependencyAnalyzer, FreshnessAnalyzer};
use crate::config::{Config, DEFAULT_HOST_CONCURRENCY};
use crate::domain::{DependencyFreshness, Lockfile, Spec};
use crate::error::AppError;
use crate::fetcher::GemInfoFetcher;
use crate::parser::LockfileParser;
use crate::progress::Progress;
use chrono::NaiveDate;
use reqwest::Url;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

type Results = Arc<Mutex<Vec<DependencyFreshness>>>;

pub struct Runner {
    parser: LockfileParser,
    fetcher: Arc<GemInfoFetcher>,
    analyzer: Arc<dyn FreshnessAnalyzer>,
    /// Versions published after this date are ignored
    as_of: Option<NaiveDate>,
    host_concurrency: usize,
    /// Register lockfile `GEM` remotes as sources for unconfigured hosts
    lockfile_sources: bool,
    progress: Progress,
}

/// State shared by every spec task of one host
struct HostWorker {
    host: String,
    fetcher: Arc<GemInfoFetcher>,
    analyzer: Arc<dyn FreshnessAnalyzer>,
    as_of: Option<NaiveDate>,
    results: Results,
    progress: Progress,
}

impl Runner {
    pub fn new(fetcher: Arc<GemInfoFetcher>) -> Self {
        Self {
            parser: LockfileParser::new(),
            fetcher,
            analyzer: Arc::new(DependencyAnalyzer::new()),
            as_of: None,
            host_concurrency: DEFAULT_HOST_CONCURRENCY,
            lockfile_sources: false,
            progress: Progress::disabled(),
        }
    }

    /// Runner backed by RubyGems-compatible registries
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let fetcher = GemInfoFetcher::from_config(config)?;
        Ok(Self::new(Arc::new(fetcher))
            .with_as_of(config.as_of)
            .with_host_concurrency(config.host_concurrency)
            .with_lockfile_sources(config.lockfile_sources)
            .with_progress(Progress::new(config.show_progress)))
    }

    pub fn with_lockfile_sources(mut self, lockfile_sources: bool) -> Self {
        self.lockfile_sources = lockfile_sources;
        self
    }

    pub fn with_as_of(mut self, as_of: Option<NaiveDate>) -> Self {
        self.as_of = as_of;
        self
    }

    pub fn with_host_concurrency(mut self, host_concurrency: usize) -> Self {
        self.host_concurrency = host_concurrency.max(1);
        self
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Analyze every registry-sourced spec in `lockfile_text`
    ///
    /// Results come back in no particular order.
    pub async fn run(&self, lockfile_text: &str) -> Vec<DependencyFreshness> {
        let lockfile = self.parser.parse(lockfile_text);
        debug!(
            sources = lockfile.sources.len(),
            specs = lockfile.spec_count(),
            "parsed lockfile"
        );
        let by_host = self.group_by_host(&lockfile);

        let total: usize = by_host.values().map(Vec::len).sum();
        let mut progress = self.progress.clone();
        progress.start(total as u64, "Checking gems");

        let results: Results = Arc::new(Mutex::new(Vec::new()));
        let mut hosts = JoinSet::new();
        for (host, specs) in by_host {
            debug!(host = %host, specs = specs.len(), "checking host");
            let worker = Arc::new(HostWorker {
                host,
                fetcher: Arc::clone(&self.fetcher),
                analyzer: Arc::clone(&self.analyzer),
                as_of: self.as_of,
                results: Arc::clone(&results),
                progress: progress.clone(),
            });
            hosts.spawn(check_host(worker, specs, self.host_concurrency));
        }

        while let Some(joined) = hosts.join_next().await {
            if let Err(e) = joined {
                warn!("Host worker failed: {}", e);
            }
        }
        progress.finish_and_clear();

        let mut results = results.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *results)
    }

    /// Specs of every usable registry source keyed by host
    ///
    /// Hosts without a configured source are kept: the fetcher skips them
    /// per gem. With `lockfile_sources` their remotes are registered first.
    fn group_by_host(&self, lockfile: &Lockfile) -> BTreeMap<String, Vec<Spec>> {
        let mut by_host: BTreeMap<String, Vec<Spec>> = BTreeMap::new();

        for source in lockfile.sources.iter().filter(|s| !s.is_fetchable()) {
            warn!(
                "Skipping {} source: unsupported source type or missing remote",
                source.kind
            );
        }

        for source in lockfile.registry_sources() {
            let Some(remote) = source.remote.as_deref() else {
                continue;
            };
            let parsed = Url::parse(remote).ok().and_then(|url| {
                let host = url.host_str()?.to_string();
                Some((url, host))
            });
            let Some((url, host)) = parsed else {
                warn!("Skipping source {}: not a valid registry URL", remote);
                continue;
            };

            if self.lockfile_sources && self.fetcher.register_source(&url) {
                debug!(host = %host, "registered lockfile source");
            }
            by_host
                .entry(host)
                .or_default()
                .extend(source.specs.iter().cloned());
        }

        by_host
    }
}

async fn check_host(worker: Arc<HostWorker>, specs: Vec<Spec>, concurrency: usize) {
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut tasks = JoinSet::new();

    for spec in specs {
        let worker = Arc::clone(&worker);
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return;
            };
            if let Some(result) = worker.check_spec(&spec).await {
                worker
                    .results
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(result);
            }
            worker.progress.inc();
        });
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            warn!("Gem check on {} failed: {}", worker.host, e);
        }
    }
}

impl HostWorker {
    async fn check_spec(&self, spec: &Spec) -> Option<DependencyFreshness> {
        let mut versions = self.fetcher.versions_for(&spec.name, &self.host).await;

        if let Some(as_of) = self.as_of {
            versions.retain(|v| v.created_at <= as_of);
        }
        if versions.is_empty() {
            warn!(
                "Skipping {}: no version metadata from {}",
                spec.name, self.host
            );
            return None;
        }

        // Newest first
        versions.sort_by(|a, b| b.number.cmp(&a.number));
        self.analyzer
            .freshness(&spec.name, spec.release_version(), &versions)
    }
}
