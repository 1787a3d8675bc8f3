//! libyear - dependency freshness for Bundler lockfiles
//!
//! Reads a `Gemfile.lock`, looks up every locked gem on its registry and
//! reports how far behind the latest release it is, both in releases and
//! in libyears (years between the release dates).

pub mod analyzer;
pub mod cache;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod output;
pub mod parser;
pub mod progress;
pub mod registry;
pub mod runner;

use crate::config::Config;
use crate::domain::DependencyFreshness;
use crate::error::AppError;
use crate::runner::Runner;

/// Analyze lockfile text against the registries in `config`
pub async fn analyze(
    lockfile_contents: &str,
    config: &Config,
) -> Result<Vec<DependencyFreshness>, AppError> {
    let runner = Runner::from_config(config)?;
    Ok(runner.run(lockfile_contents).await)
}
