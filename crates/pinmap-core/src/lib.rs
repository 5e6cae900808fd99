//! Pinmap Core - photo geolocation ingestion library.
//!
//! Pinmap turns a directory of photos into the data a map front end needs:
//! one fixed-size thumbnail per photo and a JSON index of every photo that
//! carries GPS coordinates.
//!
//! # Architecture
//!
//! ```text
//! Scan → Thumbnail (orient, cover crop) → Geotag (EXIF GPS) → Index (atomic JSON)
//! ```
//!
//! Files are processed concurrently and independently. A file that fails a
//! stage is excluded and reported; the run still publishes an index.
//!
//! # Usage
//!
//! ```rust,ignore
//! use pinmap_core::{Config, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> pinmap_core::Result<()> {
//!     let config = Config::load()?;
//!     let summary = Pipeline::new(&config).run().await?;
//!     println!("Indexed {} photos", summary.included);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod types;

#[cfg(test)]
mod testutil;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, PinmapError, PipelineError, PipelineResult, Result};
pub use output::{IndexBuilder, OutputWriter, WebPaths};
pub use pipeline::Pipeline;
pub use types::{
    Exclusion, FileOutcome, FileReport, GeoTag, GeotagOutcome, PhotoRecord, RunSummary,
    SourceImage, ThumbnailStatus,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run the pipeline once with `config`.
pub async fn run(config: &Config) -> Result<RunSummary> {
    tracing::debug!("Pinmap v{}", VERSION);
    Pipeline::new(config).run().await
}
