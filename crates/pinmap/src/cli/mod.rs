//! Command handlers.

pub mod config;
pub mod run;

use pinmap_core::{Config, ConfigError};
use std::path::Path;

/// Load the explicit config file, or fall back to the default search.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    match explicit {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}
