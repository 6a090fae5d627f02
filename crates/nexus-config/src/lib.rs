//! Configuration for the nexus tools.
//!
//! The config file is optional. Every field has a default, and the file only
//! needs to name what differs from it.

mod venv_paths;

pub use venv_paths::{resolve_site_packages, VenvPathError};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable that overrides the config file location
pub const CONFIG_ENV: &str = "NEXUS_CONFIG";

pub const DEFAULT_NAMESPACE: &str = "deepsea_nexus_local";
pub const DEFAULT_TENANT: &str = "default_tenant";
pub const DEFAULT_DATABASE: &str = "default_database";
pub const DEFAULT_PLUGIN_DIR: &str = "../skills/deepsea-nexus";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Failed to parse config file {0}: {1}")]
    Parse(PathBuf, toml::de::Error),

    #[error("Could not determine home directory")]
    NoHomeDir,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Virtual environment whose site-packages the embedded interpreter sees
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venv_path: Option<String>,
    /// Directory holding the context plugin package
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin_dir: Option<String>,
    /// Module name the plugin package is registered under
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

impl Config {
    /// Config file location: `NEXUS_CONFIG` when set and non-empty, else
    /// `~/.config/nexus/nexus.toml`.
    pub fn path() -> Result<PathBuf, ConfigError> {
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return Ok(PathBuf::from(trimmed));
            }
        }

        #[cfg(not(target_os = "windows"))]
        let dir = dirs::home_dir()
            .ok_or(ConfigError::NoHomeDir)?
            .join(".config");

        #[cfg(target_os = "windows")]
        let dir = dirs::config_dir().ok_or(ConfigError::NoHomeDir)?;

        Ok(dir.join("nexus").join("nexus.toml"))
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    pub fn get_plugin_dir(&self) -> PathBuf {
        PathBuf::from(
            self.plugin_dir
                .as_deref()
                .unwrap_or(DEFAULT_PLUGIN_DIR),
        )
    }

    pub fn get_namespace(&self) -> String {
        self.namespace
            .clone()
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string())
    }

    pub fn get_tenant(&self) -> String {
        self.tenant
            .clone()
            .unwrap_or_else(|| DEFAULT_TENANT.to_string())
    }

    pub fn get_database(&self) -> String {
        self.database
            .clone()
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string())
    }

    pub fn get_venv_path(&self) -> Option<PathBuf> {
        self.venv_path.as_deref().map(PathBuf::from)
    }
}
