//! Cheap checks run before a source is decoded.

use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::{PipelineError, PipelineResult};

/// Rejects oversized or obviously non-image sources before decoding.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Check the on-disk size against `limits.max_file_size_mb`.
    ///
    /// Runs before the file is read so huge files never get buffered.
    pub async fn check_size(&self, path: &Path) -> PipelineResult<u64> {
        let metadata = tokio::fs::metadata(path).await.map_err(|source| PipelineError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let max_bytes = self.limits.max_file_size_mb * 1024 * 1024;
        if metadata.len() > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: metadata.len() / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }
        Ok(metadata.len())
    }

    /// Check that the buffered content starts with a known image signature.
    pub fn check_header(&self, path: &Path, bytes: &[u8]) -> PipelineResult<()> {
        if bytes.len() < 4 {
            return Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: "File too small to be a valid image".to_string(),
            });
        }
        if !Self::is_valid_image_header(bytes) {
            return Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: "Unrecognized image format (invalid magic bytes)".to_string(),
            });
        }
        Ok(())
    }

    /// Check if the leading bytes match a format the decoder understands.
    fn is_valid_image_header(header: &[u8]) -> bool {
        match header {
            // JPEG
            [0xFF, 0xD8, 0xFF, ..] => true,
            // PNG
            [0x89, b'P', b'N', b'G', ..] => true,
            // WebP: RIFF....WEBP
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => true,
            // GIF
            [b'G', b'I', b'F', b'8', ..] => true,
            // BMP
            [b'B', b'M', ..] => true,
            // TIFF, little- and big-endian
            [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => true,
            _ => false,
        }
    }
}
