//! Configuration System
//!
//! Handles loading configuration from TOML files and environment variable
//! overrides. The CLI reads the platform config directory by default.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::adx::AdxConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub adx: AdxConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config.apply_env())
    }

    /// Load from the platform config directory, or fall back to defaults
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Config::default().apply_env()),
        }
    }

    /// Platform-default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("kqlforge").join("config.toml"))
    }

    /// Apply environment variable overrides
    fn apply_env(mut self) -> Self {
        if let Ok(url) = std::env::var("KQLFORGE_URL") {
            self.adx.base_url = url;
        }
        if let Ok(database) = std::env::var("KQLFORGE_DATABASE") {
            self.adx.default_database = database;
        }
        if let Ok(level) = std::env::var("KQLFORGE_LOG_LEVEL") {
            self.logging.level = level;
        }

        self
    }
}

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("failed to parse config file {path}: {error}")]
    Parse { path: PathBuf, error: String },
}
