//! Loader configuration.
//!
//! Every field except the API key has a default: `market.db` in the working
//! directory, CSV files in the working directory, the public daily
//! time-series endpoint, halt on the first failed job. The key must come
//! from the file, `ALPHAVANTAGE_API_KEY` or `--api-key`; a load without one
//! is refused before the database is touched.
//!
//! ```toml
//! database = "market.db"
//! csv_dir = "."
//! failure_policy = "abort"   # or "continue"
//!
//! [api]
//! endpoint = "https://www.alphavantage.co/query"
//! api_key = "YOUR_KEY"
//! timeout_secs = 60          # optional; no timeout when absent
//! ```

use crate::data::ingest::FailurePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://www.alphavantage.co/query";
pub const DEFAULT_DATABASE: &str = "market.db";

/// Environment variable that overrides the configured API key.
pub const API_KEY_ENV: &str = "ALPHAVANTAGE_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no API key configured: set [api] api_key, ALPHAVANTAGE_API_KEY or --api-key")]
    MissingApiKey,
}

/// HTTP API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub endpoint: String,
    pub api_key: String,
    pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: String::new(),
            timeout_secs: None,
        }
    }
}

/// Full loader configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub database: PathBuf,
    pub csv_dir: PathBuf,
    pub failure_policy: FailurePolicy,
    pub api: ApiConfig,
}

impl ApiConfig {
    /// The configured key, or `MissingApiKey` if it is blank.
    pub fn require_key(&self) -> Result<&str, ConfigError> {
        let key = self.api_key.trim();
        if key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(key)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            csv_dir: PathBuf::from("."),
            failure_policy: FailurePolicy::Abort,
            api: ApiConfig::default(),
        }
    }
}

impl IngestConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `ALPHAVANTAGE_API_KEY` if it is set and non-empty.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.api.api_key = key;
            }
        }
        self
    }
}
