//! Configuration management for pinmap.
//!
//! Configuration is read from `./pinmap.toml` when present, otherwise from the
//! platform config directory. Every section falls back to its defaults, so an
//! empty file (or no file at all) is a valid configuration.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory before the platform path.
pub const LOCAL_CONFIG_FILE: &str = "pinmap.toml";

/// Root configuration structure for pinmap.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input/output locations
    pub paths: PathsConfig,

    /// Processing settings
    pub processing: ProcessingConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Thumbnail derivation settings
    pub thumbnail: ThumbnailConfig,

    /// Index artifact settings
    pub index: IndexConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the first existing candidate path.
    ///
    /// Returns default configuration if no config file exists.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::existing_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// The config file `load()` would read, if any.
    pub fn existing_path() -> Option<PathBuf> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return Some(local);
        }
        let global = Self::default_path();
        global.is_file().then_some(global)
    }

    /// Get the platform config file path.
    ///
    /// - macOS: ~/Library/Application Support/com.pinmap.pinmap/config.toml
    /// - Linux: ~/.config/pinmap/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\pinmap\config\config.toml
    ///
    /// Falls back to ~/.pinmap/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "pinmap", "pinmap")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".pinmap").join("config.toml")
            })
    }

    /// Resolved images directory (with ~ expansion).
    pub fn images_dir(&self) -> PathBuf {
        expand(&self.paths.images_dir)
    }

    /// Resolved derivative directory.
    pub fn thumbs_dir(&self) -> PathBuf {
        self.images_dir().join(&self.paths.thumbs_subdir)
    }

    /// Resolved index artifact path (with ~ expansion).
    pub fn output_file(&self) -> PathBuf {
        expand(&self.paths.output_file)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    let expanded = shellexpand::tilde(&path_str);
    PathBuf::from(expanded.into_owned())
}
