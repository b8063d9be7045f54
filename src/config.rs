//! Application Configuration
//!
//! Provider and backend settings, persisted as TOML in the platform config
//! directory.

use crate::constants::{
    CONFIG_FILE_NAME, DEFAULT_BASE_URL, DEFAULT_DEBOUNCE_MS, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_RECORDS_PATH,
};
use crate::error::{Error, Result};
use crate::helpers::get_or_create_config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

/// Settings for a [`WindowedProvider`](crate::provider::WindowedProvider)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Quiet period before a scheduled fetch starts
    pub debounce_ms: u64,
    /// Drop results of fetches that were superseded or cleared instead of
    /// merging them
    pub guard_stale_merges: bool,
}

impl ProviderConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            guard_stale_merges: false,
        }
    }
}

/// HTTP backend serving record ranges
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Server base URL (e.g., "http://localhost:8080")
    pub base_url: String,
    /// Path of the records endpoint
    pub records_path: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl BackendConfig {
    /// Full URL of the records endpoint
    pub fn records_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.records_path.trim_start_matches('/')
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Replace the base URL, rejecting anything that is not http(s)
    pub fn set_base_url(&mut self, base_url: impl Into<String>) -> Result<()> {
        let previous = std::mem::replace(&mut self.base_url, base_url.into());
        if let Err(e) = self.validate() {
            self.base_url = previous;
            return Err(e);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::Invalid {
                message: format!("backend.base_url must be an http(s) URL: {}", self.base_url),
            });
        }
        Ok(())
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            records_path: DEFAULT_RECORDS_PATH.to_string(),
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

/// Persisted configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub backend: BackendConfig,
}

fn get_config_path() -> Result<PathBuf> {
    let config_dir = get_or_create_config_dir()?;
    let path = config_dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        std::fs::write(&path, "")?;
    }
    Ok(path)
}

impl AppConfig {
    /// Load from the default config file, creating it empty if missing
    pub fn try_load() -> Result<Self> {
        let path = get_config_path()?;
        Self::load_from(&path)
    }

    /// Load from a specific file. An empty file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        info!(path = ?path, "Loading config file");
        let value = std::fs::read_to_string(path)?;
        Self::parse(&value).map_err(|e| {
            error!(error = %e, path = ?path, "Failed to parse config file");
            e
        })
    }

    /// Parse TOML content
    pub fn parse(value: &str) -> Result<Self> {
        if value.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(value)?;
        config.backend.validate()?;
        Ok(config)
    }

    /// Save to the default config file
    pub fn save(&self) -> Result<()> {
        let path = get_config_path()?;
        self.save_to(&path)
    }

    /// Save to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!(path = ?path, "Config saved");
        Ok(())
    }
}
