//! Application error types using thiserror
//!
//! Error hierarchy:
//! - LockfileError: Issues reading the lockfile
//! - RegistryError: Issues with gem registry communication
//! - CacheError: Issues reading or writing the version metadata cache
//! - ConfigError: Issues with CLI configuration
//!
//! Only lockfile and registry-client setup errors abort a run. Registry
//! and cache failures during a run are recovered where they happen and
//! only surface as diagnostics; config errors are reported by clap.

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Lockfile(#[from] LockfileError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Errors related to reading the lockfile
#[derive(Error, Debug)]
pub enum LockfileError {
    /// Lockfile does not exist
    #[error("Lockfile not found at path: {}", path.display())]
    NotFound { path: PathBuf },

    /// Lockfile exists but could not be read
    #[error("failed to read lockfile {}: {source}", path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors related to gem registry communication
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Gem not found in registry
    #[error("gem '{package}' not found on {registry}")]
    PackageNotFound { package: String, registry: String },

    /// Network request failed
    #[error("failed to fetch gem '{package}' from {registry}: {message}")]
    NetworkError {
        package: String,
        registry: String,
        message: String,
    },

    /// Registry answered with a failure status other than 404 or 429
    #[error("failed to fetch gem '{package}' from {registry}: HTTP {status}")]
    UnexpectedStatus {
        package: String,
        registry: String,
        status: u16,
    },

    /// Rate limit exceeded
    #[error("rate limit exceeded for {registry}")]
    RateLimitExceeded { registry: String },

    /// Invalid response from registry
    #[error("invalid response from {registry} for '{package}': {message}")]
    InvalidResponse {
        package: String,
        registry: String,
        message: String,
    },

    /// Timeout
    #[error("timeout while fetching '{package}' from {registry}")]
    Timeout { package: String, registry: String },
}

/// Errors related to the on-disk version cache
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("failed to read cache entry {}: {source}", path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write cache entry {}: {source}", path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Entry exists but does not hold a serialized version list
    #[error("corrupt cache entry {}: {message}", path.display())]
    Corrupt { path: PathBuf, message: String },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid date format. Please use YYYY-MM-DD.")]
    InvalidDate { value: String },

    #[error("invalid source URL '{value}': {message}")]
    InvalidSource { value: String, message: String },
}

impl LockfileError {
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        LockfileError::NotFound { path: path.into() }
    }

    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LockfileError::ReadError {
            path: path.into(),
            source,
        }
    }
}

impl RegistryError {
    /// Creates a new PackageNotFound error
    pub fn package_not_found(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::PackageNotFound {
            package: package.into(),
            registry: registry.into(),
        }
    }

    /// Creates a new NetworkError
    pub fn network_error(
        package: impl Into<String>,
        registry: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::NetworkError {
            package: package.into(),
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Creates a new UnexpectedStatus error
    pub fn unexpected_status(
        package: impl Into<String>,
        registry: impl Into<String>,
        status: u16,
    ) -> Self {
        RegistryError::UnexpectedStatus {
            package: package.into(),
            registry: registry.into(),
            status,
        }
    }

    /// Creates a new RateLimitExceeded error
    pub fn rate_limit_exceeded(registry: impl Into<String>) -> Self {
        RegistryError::RateLimitExceeded {
            registry: registry.into(),
        }
    }

    /// Creates a new InvalidResponse error
    pub fn invalid_response(
        package: impl Into<String>,
        registry: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::InvalidResponse {
            package: package.into(),
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::Timeout {
            package: package.into(),
            registry: registry.into(),
        }
    }

    /// True for a definitive "no such gem" answer
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::PackageNotFound { .. })
    }

    /// True for failures that may succeed on another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            RegistryError::NetworkError { .. }
            | RegistryError::RateLimitExceeded { .. }
            | RegistryError::Timeout { .. } => true,
            RegistryError::UnexpectedStatus { status, .. } => *status >= 500,
            RegistryError::PackageNotFound { .. } | RegistryError::InvalidResponse { .. } => false,
        }
    }
}

impl CacheError {
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::ReadError {
            path: path.into(),
            source,
        }
    }

    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::WriteError {
            path: path.into(),
            source,
        }
    }

    pub fn corrupt(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        CacheError::Corrupt {
            path: path.into(),
            message: message.into(),
        }
    }
}
