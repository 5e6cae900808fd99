//! File discovery for the images directory.

use std::path::Path;
use walkdir::WalkDir;

use crate::config::ProcessingConfig;
use crate::error::{PinmapError, Result};
use crate::types::SourceImage;

/// Discovers photos directly inside the images directory.
pub struct FileDiscovery {
    config: ProcessingConfig,
}

impl FileDiscovery {
    /// Create a new file discovery instance.
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// List supported photos in `root`, sorted by file name.
    ///
    /// Only direct children are considered; `exclude_dir` (the derivative
    /// directory) is skipped even if it is a symlink to a file tree.
    pub fn scan(&self, root: &Path, exclude_dir: &Path) -> Result<Vec<SourceImage>> {
        // Probe readability up front so a bad root is fatal before any work starts.
        std::fs::read_dir(root).map_err(|e| PinmapError::DirectoryNotFound {
            path: root.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut files = Vec::new();

        for entry in WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry in {:?}: {}", root, e);
                    continue;
                }
            };

            let entry_path = entry.path();
            if entry_path == exclude_dir || !entry.file_type().is_file() {
                continue;
            }
            if !self.is_supported(entry_path) {
                continue;
            }

            let Some(file_name) = entry.file_name().to_str() else {
                tracing::warn!("Skipping non UTF-8 file name: {:?}", entry_path);
                continue;
            };
            files.push(SourceImage::new(file_name, entry_path));
        }

        files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        tracing::debug!("Discovered {} photo(s) in {:?}", files.len(), root);
        Ok(files)
    }

    /// Check if a file has a supported extension.
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.config
                    .supported_formats
                    .iter()
                    .any(|fmt| fmt.eq_ignore_ascii_case(ext))
            })
    }
}
