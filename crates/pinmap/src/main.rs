//! Pinmap CLI - build the thumbnails and photo index behind a map of geotagged photos.
//!
//! Pinmap scans an images directory, writes one fixed-size thumbnail per
//! photo and publishes a JSON index of every photo that carries GPS
//! coordinates. Files without coordinates or with unreadable data are
//! excluded and listed in the summary.
//!
//! # Usage
//!
//! ```bash
//! # Run with ./pinmap.toml or the platform config (or defaults)
//! pinmap
//!
//! # Run with an explicit config file
//! pinmap --config site/pinmap.toml
//!
//! # View configuration
//! pinmap config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// Pinmap - geotagged photo index and thumbnails for an interactive map.
#[derive(Parser, Debug)]
#[command(name = "pinmap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Config file (defaults to ./pinmap.toml, then the platform config path)
    #[arg(short, long, global = true, env = "PINMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate thumbnails and write the photo index (the default)
    Run,

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging needs the config, so a config error is only reported once the
    // subscriber is up (with default settings).
    let loaded = cli::load_config(cli.config.as_deref());
    let defaults = pinmap_core::Config::default();
    logging::init_from_config(
        loaded.as_ref().unwrap_or(&defaults),
        cli.verbose,
        cli.json_logs,
    );

    tracing::debug!("Pinmap v{}", pinmap_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => cli::run::execute(loaded?).await,
        Commands::Config(args) => cli::config::execute(args, cli.config.as_deref(), loaded).await,
    }
}
