use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const BASE_URL_ENV: &str = "PIPELINE_ANALYZER_API_BASE_URL";
pub const TIMEOUT_ENV: &str = "PIPELINE_ANALYZER_TIMEOUT_SECS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid base URL '{0}': expected an http:// or https:// address")]
    InvalidBaseUrl(String),

    #[error("Invalid timeout '{0}': expected a whole number of seconds")]
    InvalidTimeout(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// Load the config file if present, falling back to defaults when it doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &std::path::Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
            path: config_path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&config_content).map_err(|source| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source,
        })
    }

    /// Apply environment overrides on top of the file values.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.base_url = base_url;
        }
        if let Some(raw) = lookup(TIMEOUT_ENV).filter(|v| !v.trim().is_empty()) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
            self.request_timeout_secs = Some(secs);
        }
        Ok(self)
    }

    /// Check the base URL and strip any trailing slash so paths join cleanly.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        let trimmed = self.base_url.trim().trim_end_matches('/').to_string();
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(self.base_url));
        }
        self.base_url = trimmed;
        if self.request_timeout_secs == Some(0) {
            warn!("request timeout of 0 seconds ignored");
            self.request_timeout_secs = None;
        }
        Ok(self)
    }

    /// File, then environment, then validation. Unreadable files fall back to defaults.
    pub fn resolve() -> Result<Self, ConfigError> {
        let config = match Self::load() {
            Ok(config) => config,
            Err(ConfigError::NoConfigDir) => Self::default(),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable config file");
                Self::default()
            }
        };
        config
            .with_env_overrides(|key| std::env::var(key).ok())?
            .validated()
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;

        Ok(config_dir.join("pipeline-analyzer").join("config.json"))
    }
}
