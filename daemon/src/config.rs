//! Daemon configuration with TOML file support.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Configuration for the wicket daemon.
///
/// Loaded from a TOML file via [`ServerConfig::from_toml_file`]; CLI flags
/// and environment variables override individual fields afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_addr")]
    pub addr: String,

    /// JSON data file backing the user directory. `None` keeps the
    /// directory in memory only.
    #[serde(default)]
    pub data_file: Option<PathBuf>,

    /// Directory of static UI files served at the root.
    #[serde(default)]
    pub static_dir: Option<PathBuf>,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Badge of the chief seeded when the directory starts empty.
    #[serde(default)]
    pub seed_badge: Option<u32>,

    /// Password of the seeded chief.
    #[serde(default)]
    pub seed_password: Option<String>,
}

fn default_addr() -> String {
    "0.0.0.0:4545".to_string()
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServerConfig {
    pub fn from_toml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("ServerConfig is always serializable to TOML")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            data_file: None,
            static_dir: None,
            log_format: default_log_format(),
            log_level: default_log_level(),
            seed_badge: None,
            seed_password: None,
        }
    }
}
