//! Core data types for the pinmap ingestion pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::PipelineError;

/// A photo discovered in the images directory.
///
/// The file name is the identity of the photo for the whole run. Content is
/// never held here; stages read the file when they need it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    /// File name, unique within the images directory
    pub file_name: String,

    /// Full path to the original
    pub path: PathBuf,
}

impl SourceImage {
    pub fn new(file_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            file_name: file_name.into(),
            path: path.into(),
        }
    }

    /// Derivative location inside `thumbs_dir`, keyed by the same file name.
    pub fn thumbnail_path(&self, thumbs_dir: &Path) -> PathBuf {
        thumbs_dir.join(&self.file_name)
    }
}

/// Signed decimal degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTag {
    pub lat: f64,
    pub lng: f64,
}

/// Result of looking for coordinates in a photo's metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum GeotagOutcome {
    /// Both coordinates present and in range
    Found(GeoTag),
    /// No metadata container, or no GPS tags in it
    Missing,
    /// GPS tags present but unusable (one axis missing, bad rationals, out of range)
    Incomplete,
    /// The metadata container exists but could not be parsed
    Unreadable(String),
}

impl GeotagOutcome {
    /// Human-readable reason for an exclusion, `None` when coordinates were found.
    pub fn exclusion_reason(&self) -> Option<String> {
        match self {
            Self::Found(_) => None,
            Self::Missing => Some("no GPS metadata".to_string()),
            Self::Incomplete => Some("incomplete GPS metadata".to_string()),
            Self::Unreadable(message) => Some(format!("unreadable metadata: {message}")),
        }
    }
}

/// One entry of the index artifact.
///
/// Field names are the contract with the map front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    /// Original file name
    pub id: String,

    /// Web path to the original
    pub src: String,

    /// Web path to the derivative
    pub thumb: String,

    pub lat: f64,

    pub lng: f64,

    /// Capture date (`YYYY-MM-DD`), only when enabled and known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// What happened to the derivative of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailStatus {
    /// Generated during this run
    Created,
    /// Already on disk, left untouched
    Cached,
    /// Generation failed and the record points at the original instead
    Fallback,
}

/// Terminal state of a single file.
#[derive(Debug)]
pub enum FileOutcome {
    Included(PhotoRecord),
    NoGeotag { reason: String },
    Failed(PipelineError),
}

/// Per-file result delivered to progress callbacks and the summary.
#[derive(Debug)]
pub struct FileReport {
    pub file_name: String,

    /// `None` when the thumbnail stage failed outright
    pub thumbnail: Option<ThumbnailStatus>,

    pub outcome: FileOutcome,
}

/// A file left out of the index and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exclusion {
    pub file_name: String,
    pub reason: String,
}

/// Counts and exclusions for one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Records written to the index
    pub included: usize,

    /// Files without usable coordinates
    pub excluded_no_gps: Vec<Exclusion>,

    /// Files that failed a stage
    pub excluded_error: Vec<Exclusion>,

    pub thumbnails_created: usize,

    pub thumbnails_cached: usize,

    pub thumbnail_fallbacks: usize,

    /// Where the index was written
    pub output_path: PathBuf,

    #[serde(skip)]
    pub elapsed: Duration,
}

impl RunSummary {
    /// Total number of files seen by the run.
    pub fn total(&self) -> usize {
        self.included + self.excluded_no_gps.len() + self.excluded_error.len()
    }

    /// Fold one file's report into the counts.
    pub fn record(&mut self, report: &FileReport) {
        match report.thumbnail {
            Some(ThumbnailStatus::Created) => self.thumbnails_created += 1,
            Some(ThumbnailStatus::Cached) => self.thumbnails_cached += 1,
            Some(ThumbnailStatus::Fallback) => self.thumbnail_fallbacks += 1,
            None => {}
        }
        match &report.outcome {
            FileOutcome::Included(_) => self.included += 1,
            FileOutcome::NoGeotag { reason } => self.excluded_no_gps.push(Exclusion {
                file_name: report.file_name.clone(),
                reason: reason.clone(),
            }),
            FileOutcome::Failed(e) => self.excluded_error.push(Exclusion {
                file_name: report.file_name.clone(),
                reason: e.to_string(),
            }),
        }
    }
}
