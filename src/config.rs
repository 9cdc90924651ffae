//! Process configuration: endpoint, credentials and runner settings.
//!
//! Values come from the process environment, optionally seeded from a
//! `.env` file. The resulting [`Config`] is built once at startup and passed
//! by reference to whatever needs it.

use crate::error::{Result, RunnerError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Azure AI Foundry resource endpoint, e.g. `https://my-resource.openai.azure.com`.
pub const ENDPOINT_VAR: &str = "AZURE_OPENAI_ENDPOINT";
/// API key for the resource.
pub const API_KEY_VAR: &str = "AZURE_OPENAI_API_KEY";
/// Optional deployment name override.
pub const MODEL_VAR: &str = "SORA_MODEL";
/// Optional output directory override.
pub const OUTPUT_DIR_VAR: &str = "SORA_OUTPUT_DIR";
/// Optional poll interval override, in seconds.
pub const POLL_INTERVAL_VAR: &str = "SORA_POLL_INTERVAL_SECS";
/// Optional polling timeout, in seconds. Unset means wait forever.
pub const TIMEOUT_VAR: &str = "SORA_TIMEOUT_SECS";

/// Default directory videos are written to.
pub const DEFAULT_OUTPUT_DIR: &str = "videos";
/// Default deployment name.
pub const DEFAULT_MODEL: &str = "sora-2";
/// Default delay between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Settings that drive a single [`VideoRunner`](crate::VideoRunner).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Directory finished videos are written to. Created if missing.
    pub output_dir: PathBuf,
    /// Fixed delay between status polls.
    pub poll_interval: Duration,
    /// Upper bound on polling time. `None` polls until a terminal status.
    pub timeout: Option<Duration>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }
}

/// Full process configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// Resource endpoint, without the `/openai/v1` suffix.
    pub endpoint: String,
    /// API key sent as both bearer token and `api-key` header.
    pub api_key: String,
    /// Deployment name passed as `model`.
    pub model: String,
    /// Runner settings.
    pub runner: RunnerConfig,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("runner", &self.runner)
            .finish()
    }
}

impl Config {
    /// Loads `.env` from the working directory if present, then reads the
    /// environment.
    pub fn load() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded env file"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(RunnerError::Config(format!("failed to read .env: {e}"))),
        }
        Self::from_env()
    }

    /// Reads a specific env file without touching the process environment.
    /// Variables already set in the environment take precedence over the file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_file_with(path.as_ref(), |key| std::env::var(key).ok())
    }

    fn from_file_with<F>(path: &Path, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read_err =
            |e: dotenvy::Error| RunnerError::Config(format!("failed to read {}: {e}", path.display()));
        let file = dotenvy::from_path_iter(path)
            .map_err(read_err)?
            .collect::<std::result::Result<HashMap<String, String>, _>>()
            .map_err(read_err)?;
        tracing::debug!(path = %path.display(), vars = file.len(), "loaded env file");
        Self::from_lookup(|key| env(key).or_else(|| file.get(key).cloned()))
    }

    /// Reads configuration from the process environment only.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| RunnerError::Config(format!("{key} is not set")))
        };

        let endpoint = required(ENDPOINT_VAR)?;
        let api_key = required(API_KEY_VAR)?;
        let model = lookup(MODEL_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let output_dir = lookup(OUTPUT_DIR_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
        let poll_interval = parse_secs(&lookup, POLL_INTERVAL_VAR)?.unwrap_or(DEFAULT_POLL_INTERVAL);
        let timeout = parse_secs(&lookup, TIMEOUT_VAR)?;

        Ok(Self {
            endpoint,
            api_key,
            model,
            runner: RunnerConfig {
                output_dir,
                poll_interval,
                timeout,
            },
        })
    }

    /// Returns the runner settings.
    pub fn runner_config(&self) -> RunnerConfig {
        self.runner.clone()
    }
}

fn parse_secs<F>(lookup: &F, key: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| RunnerError::Config(format!("{key} must be a whole number of seconds"))),
    }
}
