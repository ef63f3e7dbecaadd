//! config.toml parsing and resolution.
//!
//! Every field is optional in the file. [`RegistryConfig::resolve`] fills
//! the gaps with defaults, logging a warning for the ones operators
//! usually want to set explicitly.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_SPEC_PATH: &str = "spec.yml";
pub const DEFAULT_STORE_PATH: &str = "./servicestore.redb";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid bind address {value:?}: {source}")]
    InvalidAddress {
        value: String,
        source: std::net::AddrParseError,
    },

    #[error("invalid polling interval {value:?}: {source}")]
    InvalidInterval {
        value: String,
        source: humantime::DurationError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Memory,
    Redb,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub address: Option<String>,
    pub spec_path: Option<PathBuf>,
    pub store: StoreConfig,
    pub polling: PollingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    #[serde(rename = "type")]
    pub kind: Option<StoreKind>,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub enabled: Option<bool>,
    /// Duration string such as "30s" or "1m 30s".
    pub interval: Option<String>,
}

/// Fully resolved settings the daemon runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub address: SocketAddr,
    pub spec_path: PathBuf,
    pub store: StoreSettings,
    /// `Some` when health polling is enabled.
    pub poll_interval: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSettings {
    Memory,
    Redb { path: PathBuf },
}

impl RegistryConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Like [`from_file`](Self::from_file), but a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            warn!(?path, "config file not found, using defaults and environment");
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    pub fn resolve(&self) -> Result<Settings, ConfigError> {
        let address = match &self.address {
            Some(address) => address.as_str(),
            None => {
                warn!(address = DEFAULT_ADDRESS, "no bind address configured, using default");
                DEFAULT_ADDRESS
            }
        };
        let address = address
            .parse()
            .map_err(|source| ConfigError::InvalidAddress {
                value: address.to_string(),
                source,
            })?;

        let store = match self.store.kind.unwrap_or(StoreKind::Memory) {
            StoreKind::Memory => StoreSettings::Memory,
            StoreKind::Redb => {
                let path = self.store.path.clone().unwrap_or_else(|| {
                    warn!(path = DEFAULT_STORE_PATH, "redb store without a path, using default");
                    PathBuf::from(DEFAULT_STORE_PATH)
                });
                StoreSettings::Redb { path }
            }
        };

        let poll_interval = if self.polling.enabled.unwrap_or(false) {
            Some(match &self.polling.interval {
                Some(value) => humantime::parse_duration(value).map_err(|source| {
                    ConfigError::InvalidInterval {
                        value: value.clone(),
                        source,
                    }
                })?,
                None => {
                    warn!(interval = ?DEFAULT_POLL_INTERVAL, "polling without an interval, using default");
                    DEFAULT_POLL_INTERVAL
                }
            })
        } else {
            None
        };

        Ok(Settings {
            address,
            spec_path: self
                .spec_path
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SPEC_PATH)),
            store,
            poll_interval,
        })
    }
}
