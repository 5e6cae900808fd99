//! Index artifact: web paths, JSON array serialization and atomic replace.

use serde::Serialize;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::{PinmapError, Result};
use crate::types::{GeoTag, PhotoRecord};

/// Builds the public URLs the map front end loads.
#[derive(Debug, Clone)]
pub struct WebPaths {
    base: String,
    thumbs_subdir: String,
}

impl WebPaths {
    /// `base_path` is normalized to a single leading slash and no trailing
    /// slash; absolute URLs (`https://…`) only lose the trailing slash.
    pub fn new(base_path: &str, thumbs_subdir: &str) -> Self {
        let base_path = base_path.trim();
        let base = if base_path.contains("://") {
            base_path.trim_end_matches('/').to_string()
        } else {
            match base_path.trim_matches('/') {
                "" => String::new(),
                trimmed => format!("/{trimmed}"),
            }
        };
        Self {
            base,
            thumbs_subdir: thumbs_subdir.to_string(),
        }
    }

    pub fn src(&self, file_name: &str) -> String {
        format!("{}/{}", self.base, file_name)
    }

    pub fn thumb(&self, file_name: &str) -> String {
        format!("{}/{}/{}", self.base, self.thumbs_subdir, file_name)
    }

    /// Record for a geotagged photo; `use_source_as_thumb` points `thumb` at
    /// the original when no derivative could be produced.
    pub fn record(&self, file_name: &str, tag: GeoTag, use_source_as_thumb: bool) -> PhotoRecord {
        let src = self.src(file_name);
        let thumb = if use_source_as_thumb {
            src.clone()
        } else {
            self.thumb(file_name)
        };
        PhotoRecord {
            id: file_name.to_string(),
            src,
            thumb,
            lat: tag.lat,
            lng: tag.lng,
            date: None,
        }
    }
}

/// A writer that serializes a collection as one JSON array.
pub struct OutputWriter<W: Write> {
    writer: W,
    pretty: bool,
}

impl<W: Write> OutputWriter<W> {
    /// Create a new output writer.
    ///
    /// # Arguments
    ///
    /// * `writer` - The underlying writer (file, buffer, etc.)
    /// * `pretty` - Whether to pretty-print (two-space indentation)
    pub fn new(writer: W, pretty: bool) -> Self {
        Self { writer, pretty }
    }

    /// Write `items` as a JSON array followed by a newline.
    pub fn write_all<T: Serialize>(&mut self, items: &[T]) -> io::Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, items).map_err(io::Error::other)?;
        } else {
            serde_json::to_writer(&mut self.writer, items).map_err(io::Error::other)?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Accumulates records in emission order and writes the index artifact.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    records: Vec<PhotoRecord>,
    pretty: bool,
}

impl IndexBuilder {
    pub fn new(pretty: bool) -> Self {
        Self {
            records: Vec::new(),
            pretty,
        }
    }

    pub fn push(&mut self, record: PhotoRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[PhotoRecord] {
        &self.records
    }

    /// Replace the artifact at `path` with the accumulated records.
    ///
    /// The array is written to a temp file in the same directory and renamed
    /// over `path`, so consumers see either the previous artifact or the new
    /// one in full. On failure the previous artifact is left as it was.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let write_failure = |message: String| PinmapError::WriteFailure {
            path: path.to_path_buf(),
            message,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| write_failure(e.to_string()))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".pinmap-index-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| write_failure(e.to_string()))?;

        {
            let mut writer = OutputWriter::new(BufWriter::new(tmp.as_file_mut()), self.pretty);
            writer
                .write_all(&self.records)
                .and_then(|()| writer.flush())
                .map_err(|e| write_failure(e.to_string()))?;
        }
        tmp.as_file()
            .sync_all()
            .map_err(|e| write_failure(e.to_string()))?;

        tmp.persist(path)
            .map_err(|e| write_failure(e.error.to_string()))?;
        tracing::info!("Index written to {:?} ({} records)", path, self.records.len());
        Ok(())
    }
}
