//! Error types for the pinmap ingestion pipeline.
//!
//! Errors are split by blast radius: [`PinmapError`] aborts a run, while
//! [`PipelineError`] is always contained to the file it describes and ends
//! up in the run summary instead of unwinding the batch.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level, run-fatal error type.
#[derive(Error, Debug)]
pub enum PinmapError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The images directory is missing or cannot be listed
    #[error("Images directory not found: {path} ({reason})")]
    DirectoryNotFound { path: PathBuf, reason: String },

    /// The index artifact could not be written or replaced
    #[error("Failed to write index to {path}: {message}")]
    WriteFailure { path: PathBuf, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Per-file errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The source file could not be read
    #[error("Read error for {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Unsupported image format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Operation timed out
    #[error("Timeout in {stage} stage for {path} after {timeout_ms}ms")]
    Timeout {
        path: PathBuf,
        stage: String,
        timeout_ms: u64,
    },

    /// Encoding or publishing the derivative failed
    #[error("Thumbnail write failed for {path}: {message}")]
    ThumbnailWrite { path: PathBuf, message: String },

    /// The worker task for this file did not complete
    #[error("Worker for {path} failed: {message}")]
    Task { path: PathBuf, message: String },
}

impl PipelineError {
    /// Short machine-friendly label for the summary and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Read { .. } => "read",
            Self::Decode { .. } => "decode",
            Self::UnsupportedFormat { .. } => "unsupported-format",
            Self::FileTooLarge { .. } => "file-too-large",
            Self::ImageTooLarge { .. } => "image-too-large",
            Self::Timeout { .. } => "timeout",
            Self::ThumbnailWrite { .. } => "thumbnail-write",
            Self::Task { .. } => "task",
        }
    }
}

/// Convenience type alias for pinmap results.
pub type Result<T> = std::result::Result<T, PinmapError>;

/// Convenience type alias for per-file results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
