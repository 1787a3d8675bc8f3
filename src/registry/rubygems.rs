//! RubyGems registry client
//!
//! Fetches the published version history of a gem from a RubyGems-compatible
//! server (rubygems.org, Gemfury, a self-hosted Gemstash, ...).
//! API endpoint: {source}/api/v1/versions/{gem}.json

use crate::error::RegistryError;
use crate::registry::client::Credentials;
use crate::registry::{ClientFactory, GemRegistry, HttpClient, RawGemVersion};
use async_trait::async_trait;
use reqwest::Url;
use std::sync::Arc;

/// Client for one RubyGems-compatible source
pub struct RubyGemsClient {
    client: HttpClient,
    /// Source URL without userinfo and trailing slash
    base_url: String,
    /// Host name used in error messages
    host: String,
    credentials: Option<Credentials>,
}

impl RubyGemsClient {
    /// Create a client for `source`, taking basic auth from its userinfo
    pub fn new(client: HttpClient, source: &Url) -> Self {
        let credentials = (!source.username().is_empty()).then(|| Credentials {
            username: source.username().to_string(),
            password: source.password().map(str::to_string),
        });

        let mut base = source.clone();
        // Only fails for URLs that cannot carry a userinfo, which then have none
        let _ = base.set_username("");
        let _ = base.set_password(None);
        base.set_query(None);
        base.set_fragment(None);

        Self {
            client,
            base_url: base.as_str().trim_end_matches('/').to_string(),
            host: source.host_str().unwrap_or_default().to_string(),
            credentials,
        }
    }

    /// Build the versions URL for a gem
    fn build_url(&self, gem: &str) -> String {
        format!("{}/api/v1/versions/{}.json", self.base_url, gem)
    }
}

#[async_trait]
impl GemRegistry for RubyGemsClient {
    fn registry_name(&self) -> &str {
        &self.host
    }

    async fn fetch_versions(&self, gem: &str) -> Result<Vec<RawGemVersion>, RegistryError> {
        let url = self.build_url(gem);
        self.client
            .get_json(&url, gem, self.registry_name(), self.credentials.as_ref())
            .await
    }
}

/// Builds [`RubyGemsClient`]s sharing one underlying HTTP client
#[derive(Clone)]
pub struct RubyGemsFactory {
    client: HttpClient,
}

impl RubyGemsFactory {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

impl ClientFactory for RubyGemsFactory {
    fn create(&self, source: &Url) -> Arc<dyn GemRegistry> {
        Arc::new(RubyGemsClient::new(self.client.clone(), source))
    }
}
