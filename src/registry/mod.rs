//! Gem registry access
//!
//! This module provides:
//! - HTTP client shared foundation (single attempt per call)
//! - RubyGems-compatible version API client
//! - A bounded per-host client pool
//! - A per-host request rate limiter

mod client;
mod pool;
mod rate_limit;
mod rubygems;

pub use client::{Credentials, HttpClient};
pub use pool::{ClientPool, PooledClient};
pub use rate_limit::{RateLimiter, DEFAULT_RATE_LIMIT};
pub use rubygems::{RubyGemsClient, RubyGemsFactory};

use crate::error::RegistryError;
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A version record as returned by the registry, before any parsing
///
/// This is also the on-disk cache format, so it only holds strings and
/// flags and stays independent of the in-memory version types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawGemVersion {
    pub number: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerelease: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl RawGemVersion {
    pub fn new(number: impl Into<String>, created_at: impl Into<String>, prerelease: bool) -> Self {
        Self {
            number: number.into(),
            created_at: created_at.into(),
            prerelease: Some(prerelease),
            platform: None,
        }
    }
}

/// A source of gem version histories
#[async_trait]
pub trait GemRegistry: Send + Sync {
    /// Name used in diagnostics (normally the host)
    fn registry_name(&self) -> &str;

    /// Fetch every published version of a gem
    async fn fetch_versions(&self, gem: &str) -> Result<Vec<RawGemVersion>, RegistryError>;
}

/// Builds a registry client for a configured source URL
pub trait ClientFactory: Send + Sync {
    fn create(&self, source: &Url) -> Arc<dyn GemRegistry>;
}
