//! Process configuration.
//!
//! Loaded once at startup from YAML and then passed by value (or behind an
//! `Arc`) into the pieces that need it. Nothing reads configuration from
//! ambient global state.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::rest::settings::{GlobalDefaults, ResourceOverrides};

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub datastore: DatastoreConfig,
    /// Resource name → explicit overrides of the global defaults.
    pub domain: BTreeMap<String, ResourceOverrides>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
        }
    }
}

/// Settings that shape every URI the API hands out, plus the defaults each
/// resource inherits.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Host (and port) prepended to every link, e.g. `localhost:5000`.
    pub server_name: Option<String>,
    pub url_prefix: String,
    pub api_version: String,
    pub defaults: GlobalDefaults,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatastoreConfig {
    /// Upper bound for a single datastore call.
    pub timeout_ms: u64,
    /// Source name → documents loaded into the in-memory datastore.
    pub seed: BTreeMap<String, Vec<serde_json::Map<String, serde_json::Value>>>,
}

impl Default for DatastoreConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            seed: BTreeMap::new(),
        }
    }
}

impl DatastoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Config {
    /// Loads the file named by `CONFIG` (default `config.yaml`), falling back
    /// to built-in defaults when it does not exist. `LISTEN` overrides the
    /// listen address.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut cfg = if Path::new(&path).exists() {
            Self::load_from(&path)?
        } else {
            tracing::info!(path = %path, "No config file found, using defaults");
            Self::default()
        };

        if let Ok(listen_addr) = std::env::var("LISTEN") {
            cfg.server.listen_addr = listen_addr;
        }

        Ok(cfg)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }
}
