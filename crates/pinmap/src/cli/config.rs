//! The `pinmap config` command for configuration management.

use clap::{Args, Subcommand};
use pinmap_core::{Config, ConfigError};
use std::path::{Path, PathBuf};

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,

    /// Show the config file path that is (or would be) used
    Path,

    /// Initialize a new config file with defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the config command.
///
/// `explicit` is the global `--config` flag and `loaded` the result of
/// loading it (or of the default search).
pub async fn execute(
    args: ConfigArgs,
    explicit: Option<&Path>,
    loaded: Result<Config, ConfigError>,
) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let toml = loaded?.to_toml()?;
            println!("{}", toml);
        }

        ConfigCommand::Path => {
            println!("{}", resolve_path(explicit).display());
        }

        ConfigCommand::Init { force } => {
            let path = explicit
                .map(Path::to_path_buf)
                .unwrap_or_else(Config::default_path);
            init(&path, force)?;
            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

/// The file a run reads, or where `init` would write when there is none.
fn resolve_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or_else(Config::existing_path)
        .unwrap_or_else(Config::default_path)
}

/// Write the default configuration to `path`.
fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at: {}\nUse --force to overwrite.",
            path.display()
        );
    }

    // Ensure parent directory exists
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let toml = Config::default().to_toml()?;
    std::fs::write(path, toml)?;
    Ok(())
}
