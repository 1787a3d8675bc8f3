//! HTTP client shared foundation
//!
//! This module provides a shared HTTP client with:
//! - Configurable timeout and User-Agent
//! - Optional HTTP basic auth for private gem servers
//! - Status classification (404, 429, other failures)
//!
//! Every call is a single request. Retries belong to the caller so that
//! each attempt can go through the per-host rate limiter.

use crate::error::RegistryError;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Default timeout for HTTP requests (30 seconds)
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default User-Agent header
const DEFAULT_USER_AGENT: &str = concat!("libyear/", env!("CARGO_PKG_VERSION"));

/// Basic auth credentials taken from a source URL's userinfo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

/// Thin reqwest wrapper mapping failures onto [`RegistryError`]
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, RegistryError> {
        Self::with_config(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(timeout: Duration, user_agent: &str) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                RegistryError::network_error(
                    "",
                    "HTTP client",
                    format!("failed to create HTTP client: {}", e),
                )
            })?;

        Ok(Self { client })
    }

    /// Perform one GET request with error context
    pub async fn get_with_context(
        &self,
        url: &str,
        package: &str,
        registry: &str,
        credentials: Option<&Credentials>,
    ) -> Result<reqwest::Response, RegistryError> {
        let mut request = self.client.get(url);
        if let Some(creds) = credentials {
            request = request.basic_auth(&creds.username, creds.password.as_ref());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                RegistryError::timeout(package, registry)
            } else {
                RegistryError::network_error(package, registry, e.to_string())
            }
        })?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => Err(RegistryError::rate_limit_exceeded(registry)),
            StatusCode::NOT_FOUND => Err(RegistryError::package_not_found(package, registry)),
            status if !status.is_success() => Err(RegistryError::unexpected_status(
                package,
                registry,
                status.as_u16(),
            )),
            _ => Ok(response),
        }
    }

    /// Perform a GET request and parse the JSON body
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        package: &str,
        registry: &str,
        credentials: Option<&Credentials>,
    ) -> Result<T, RegistryError> {
        let response = self
            .get_with_context(url, package, registry, credentials)
            .await?;

        response.json::<T>().await.map_err(|e| {
            RegistryError::invalid_response(package, registry, format!("failed to parse JSON: {}", e))
        })
    }
}
