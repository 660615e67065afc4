//! Application configuration
//!
//! Endpoint defaults persist to a TOML file in the platform config
//! directory, so a master/slave pair keeps its last-used address between
//! runs. Missing file or fields fall back to defaults.

use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_HOST, DEFAULT_PORT};
use crate::error::{Error, Result};

/// Network endpoint settings shared by both roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Bind host (master) or connect host (slave)
    pub host: String,
    /// TCP port of the sync channel
    pub port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
        }
    }
}

impl NetworkConfig {
    /// `host:port` form accepted by the socket APIs.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub network: NetworkConfig,
}

impl AppConfig {
    /// Load from the platform config dir, or defaults when no file exists.
    pub fn load() -> Result<Self> {
        let Some(path) = Self::config_path() else {
            return Ok(Self::default());
        };
        if !path.is_file() {
            return Ok(Self::default());
        }

        let text = fs::read_to_string(&path)?;
        toml::from_str(&text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Persist the current settings to the platform config dir.
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Err(Error::Config("no config directory available".into()));
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let text = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(&path, text)?;
        Ok(())
    }

    /// Location of the config file, if the platform exposes a config dir.
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "lan-player-sync")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
