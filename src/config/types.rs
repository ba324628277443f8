//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::defaults::{
    default_adapter_timeout, default_database_path, default_metrics_port, default_sweep_interval,
    default_true,
};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Daemon configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Database configuration.
    pub database: Option<DatabaseConfig>,
    /// Expiry sweeper configuration.
    #[serde(default)]
    pub sweeper: SweeperConfig,
    /// Capability adapter configuration.
    #[serde(default)]
    pub adapter: AdapterConfig,
    /// Prometheus endpoint configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Database path, falling back to `restrictd.db`.
    pub fn database_path(&self) -> String {
        self.database
            .as_ref()
            .map(|d| d.path.clone())
            .unwrap_or_else(default_database_path)
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file, or `:memory:`.
    pub path: String,
}

/// Expiry sweeper configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SweeperConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between sweep passes.
    #[serde(default = "default_sweep_interval")]
    pub interval_secs: u64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_sweep_interval(),
        }
    }
}

impl SweeperConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Which capability adapter drives the platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    /// Log only; nothing reaches the platform.
    #[default]
    Noop,
    /// POST capability changes to `url`.
    Webhook,
}

/// Capability adapter configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AdapterConfig {
    #[serde(default)]
    pub kind: AdapterKind,
    /// Bridge endpoint for the webhook adapter.
    pub url: Option<String>,
    /// Bound on a single grant/revoke call.
    #[serde(default = "default_adapter_timeout")]
    pub timeout_secs: u64,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            kind: AdapterKind::default(),
            url: None,
            timeout_secs: default_adapter_timeout(),
        }
    }
}

impl AdapterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Prometheus endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Listen port; `0` disables the endpoint.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
        }
    }
}
