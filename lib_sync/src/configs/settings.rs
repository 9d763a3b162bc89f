//! # Sync Settings
//!
//! Everything a front-end needs to stand up a [`crate::SyncEngine`] against a
//! real backend. Values can come from a JSON file (camelCase keys, every key
//! optional) and are checked by [`SyncSettings::validate`] before use.

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fmt, fs};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{EngineOptions, DEFAULT_MILEAGE_INPUT, POLL_INTERVAL};
use crate::retrieve::{ApiClientOptions, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};

/// Backend root used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/";

/// Why settings could not be loaded or used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("I/O error reading {}: {source}", .path.display())]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid JSON for [`SyncSettings`].
    #[error("Invalid settings file {}: {source}", .path.display())]
    Parse {
        /// File that was being parsed.
        path: PathBuf,
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// The base URL is malformed or not http(s).
    #[error("Invalid base URL {url:?}: {reason}")]
    BaseUrl {
        /// URL as configured.
        url: String,
        /// Why it was refused.
        reason: String,
    },

    /// A setting holds a value outside its allowed range.
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        /// Name of the offending setting.
        field: &'static str,
        /// Why the value was refused.
        reason: String,
    },
}

/// Engine, transport and logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncSettings {
    /// Backend root, e.g. `http://localhost:8080/`.
    pub base_url: String,
    /// Per-request timeout in seconds. Must be non-zero.
    pub request_timeout_secs: u64,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Initial mileage input.
    pub default_mileage: f64,
    /// Directory for the rolling JSON log files.
    pub log_dir: PathBuf,
    /// Log filter directive used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            default_mileage: DEFAULT_MILEAGE_INPUT,
            log_dir: PathBuf::from("logs"),
            log_level: "info".to_string(),
        }
    }
}

impl SyncSettings {
    /// Reads a settings file. Missing keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Rejects settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let parsed = url::Url::parse(&self.base_url).map_err(|e| ConfigError::BaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::BaseUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "requestTimeoutSecs",
                reason: "must be at least one second".to_string(),
            });
        }
        if !self.default_mileage.is_finite() || self.default_mileage < 0.0 {
            return Err(ConfigError::Invalid {
                field: "defaultMileage",
                reason: format!("{} is not a finite, non-negative number", self.default_mileage),
            });
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "userAgent",
                reason: "must not be blank".to_string(),
            });
        }
        Ok(())
    }

    /// Transport options for [`crate::retrieve::ApiClient`].
    pub fn api_client_options(&self) -> ApiClientOptions {
        ApiClientOptions {
            timeout: Duration::from_secs(self.request_timeout_secs),
            user_agent: self.user_agent.clone(),
        }
    }

    /// Engine options. The poll cadence is fixed.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            default_mileage: self.default_mileage,
            poll_interval: POLL_INTERVAL,
        }
    }
}

impl fmt::Display for SyncSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SyncSettings
    Base URL: {},
    Request timeout: {}s,
    User agent: {},
    Default mileage: {},
    Log dir: {},
    Log level: {}",
            self.base_url,
            self.request_timeout_secs,
            self.user_agent,
            self.default_mileage,
            self.log_dir.display(),
            self.log_level
        )
    }
}
