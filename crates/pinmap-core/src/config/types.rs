//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Filesystem layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding the original photos
    pub images_dir: PathBuf,

    /// Name of the derivative directory inside `images_dir`
    pub thumbs_subdir: String,

    /// Where the JSON index is written
    pub output_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            images_dir: PathBuf::from("public/images"),
            thumbs_subdir: "thumbs".to_string(),
            output_file: PathBuf::from("public/photos.json"),
        }
    }
}

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of files processed concurrently
    pub parallel_workers: usize,

    /// Recognized input extensions (matched case-insensitively)
    pub supported_formats: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 4,
            supported_formats: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "webp".to_string(),
            ],
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            max_image_dimension: 20000,
            decode_timeout_ms: 30000,
        }
    }
}

/// Thumbnail derivation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Derivative width in pixels
    pub width: u32,

    /// Derivative height in pixels
    pub height: u32,

    /// Quality used when the derivative is a JPEG (1-100)
    pub jpeg_quality: u8,

    /// Keep a geotagged photo in the index when its thumbnail fails,
    /// pointing `thumb` at the original.
    pub fallback_to_source: bool,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            width: 200,
            height: 200,
            jpeg_quality: 80,
            fallback_to_source: false,
        }
    }
}

/// Index artifact settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Public URL prefix under which `images_dir` is served
    pub base_path: String,

    /// Pretty-print the JSON array
    pub pretty: bool,

    /// Emit the capture date (`YYYY-MM-DD`) when the photo has one
    pub include_date: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            base_path: "/images".to_string(),
            pretty: true,
            include_date: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: pretty or json
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
