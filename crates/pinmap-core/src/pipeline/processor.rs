//! Pipeline orchestration: scan, per-file stages, index publication.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::output::{IndexBuilder, WebPaths};
use crate::types::{
    FileOutcome, FileReport, GeotagOutcome, RunSummary, SourceImage, ThumbnailStatus,
};

use super::discovery::FileDiscovery;
use super::metadata::MetadataExtractor;
use super::thumbnail::ThumbnailGenerator;

/// Runs one file through the thumbnail and geotag stages.
struct FileWorker {
    thumbnails: ThumbnailGenerator,
    thumbs_dir: PathBuf,
    paths: WebPaths,
    fallback_to_source: bool,
    include_date: bool,
}

impl FileWorker {
    async fn process(&self, source: SourceImage) -> FileReport {
        let span = tracing::debug_span!("file", name = %source.file_name);
        self.process_inner(source).instrument(span).await
    }

    async fn process_inner(&self, source: SourceImage) -> FileReport {
        let start = Instant::now();
        let target = source.thumbnail_path(&self.thumbs_dir);

        let thumbnail = match self.thumbnails.derive(&source, &target).await {
            Ok(status) => status,
            Err(e) if self.fallback_to_source => {
                tracing::warn!(
                    "Thumbnail failed for {}, using original instead: {}",
                    source.file_name,
                    e
                );
                ThumbnailStatus::Fallback
            }
            Err(e) => {
                tracing::error!("Failed: {} - {}", source.file_name, e);
                return FileReport {
                    file_name: source.file_name,
                    thumbnail: None,
                    outcome: FileOutcome::Failed(e),
                };
            }
        };
        tracing::trace!("  Thumbnail ({:?}): {:?}", thumbnail, start.elapsed());

        let path = source.path.clone();
        let extracted = tokio::task::spawn_blocking(move || MetadataExtractor::extract(&path))
            .await
            .map_err(|e| PipelineError::Task {
                path: source.path.clone(),
                message: format!("metadata task failed: {}", e),
            })
            .and_then(|result| result);

        let metadata = match extracted {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::error!("Failed: {} - {}", source.file_name, e);
                return FileReport {
                    file_name: source.file_name,
                    thumbnail: Some(thumbnail),
                    outcome: FileOutcome::Failed(e),
                };
            }
        };
        tracing::trace!("  Metadata: {:?}", start.elapsed());

        let outcome = match metadata.geotag {
            GeotagOutcome::Found(tag) => {
                let mut record = self.paths.record(
                    &source.file_name,
                    tag,
                    thumbnail == ThumbnailStatus::Fallback,
                );
                if self.include_date {
                    record.date = metadata.date;
                }
                tracing::info!(
                    "Included: {} ({:.6}, {:.6})",
                    source.file_name,
                    record.lat,
                    record.lng
                );
                FileOutcome::Included(record)
            }
            other => {
                let reason = other
                    .exclusion_reason()
                    .unwrap_or_else(|| "no GPS metadata".to_string());
                if matches!(other, GeotagOutcome::Unreadable(_)) {
                    tracing::warn!("Skipped: {} - {}", source.file_name, reason);
                } else {
                    tracing::info!("Skipped: {} - {}", source.file_name, reason);
                }
                FileOutcome::NoGeotag { reason }
            }
        };

        tracing::debug!("Processed {} in {:?}", source.file_name, start.elapsed());
        FileReport {
            file_name: source.file_name,
            thumbnail: Some(thumbnail),
            outcome,
        }
    }
}

/// The ingestion run: scan the images directory, process every photo with
/// bounded concurrency and publish the index.
pub struct Pipeline {
    discovery: FileDiscovery,
    worker: Arc<FileWorker>,
    images_dir: PathBuf,
    output_file: PathBuf,
    parallel_workers: usize,
    pretty: bool,
}

impl Pipeline {
    /// Create a pipeline from a validated configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            discovery: FileDiscovery::new(config.processing.clone()),
            worker: Arc::new(FileWorker {
                thumbnails: ThumbnailGenerator::new(
                    config.thumbnail.clone(),
                    config.limits.clone(),
                ),
                thumbs_dir: config.thumbs_dir(),
                paths: WebPaths::new(&config.index.base_path, &config.paths.thumbs_subdir),
                fallback_to_source: config.thumbnail.fallback_to_source,
                include_date: config.index.include_date,
            }),
            images_dir: config.images_dir(),
            output_file: config.output_file(),
            parallel_workers: config.processing.parallel_workers.max(1),
            pretty: config.index.pretty,
        }
    }

    /// List the photos a run would process, in index order.
    pub fn discover(&self) -> Result<Vec<SourceImage>> {
        self.discovery
            .scan(&self.images_dir, &self.worker.thumbs_dir)
    }

    /// Run without progress reporting.
    pub async fn run(&self) -> Result<RunSummary> {
        self.run_with(|_| {}).await
    }

    /// Run, calling `on_file` as each file reaches its terminal state.
    ///
    /// Callbacks fire in completion order. The index is always written in
    /// scan order regardless of which worker finished first. Per-file
    /// failures end up in the summary; only an unreadable images directory
    /// or a failed index write is returned as an error.
    pub async fn run_with<F>(&self, on_file: F) -> Result<RunSummary>
    where
        F: FnMut(&FileReport),
    {
        let sources = self.discover()?;
        self.run_sources(sources, on_file).await
    }

    /// Run over an already scanned list (see [`Pipeline::discover`]).
    ///
    /// `sources` are indexed in the order given.
    pub async fn run_sources<F>(
        &self,
        sources: Vec<SourceImage>,
        mut on_file: F,
    ) -> Result<RunSummary>
    where
        F: FnMut(&FileReport),
    {
        let start = Instant::now();
        tracing::info!("Found {} photo(s) in {:?}", sources.len(), self.images_dir);

        if let Err(e) = tokio::fs::create_dir_all(&self.worker.thumbs_dir).await {
            // Every file will fail its thumbnail stage and report why.
            tracing::error!(
                "Cannot create thumbnail directory {:?}: {}",
                self.worker.thumbs_dir,
                e
            );
        }

        let reports = self.process_all(sources, &mut on_file).await;

        let mut summary = RunSummary::default();
        let mut index = IndexBuilder::new(self.pretty);
        for report in reports {
            summary.record(&report);
            if let FileOutcome::Included(record) = report.outcome {
                index.push(record);
            }
        }

        index.write_to(&self.output_file)?;

        summary.output_path = self.output_file.clone();
        summary.elapsed = start.elapsed();
        tracing::info!(
            "Indexed {} of {} photo(s) in {:.1}s",
            summary.included,
            summary.total(),
            summary.elapsed.as_secs_f64()
        );
        Ok(summary)
    }

    /// Process every source with at most `parallel_workers` in flight and
    /// return the reports in scan order.
    async fn process_all<F>(&self, sources: Vec<SourceImage>, on_file: &mut F) -> Vec<FileReport>
    where
        F: FnMut(&FileReport),
    {
        let semaphore = Arc::new(Semaphore::new(self.parallel_workers));
        let identities: Vec<(String, PathBuf)> = sources
            .iter()
            .map(|s| (s.file_name.clone(), s.path.clone()))
            .collect();
        let mut slots: Vec<Option<FileReport>> = identities.iter().map(|_| None).collect();
        let mut tasks = JoinSet::new();

        for (index, source) in sources.into_iter().enumerate() {
            let worker = Arc::clone(&self.worker);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                // Never closed.
                let _permit = semaphore.acquire_owned().await.ok();
                let file_name = source.file_name.clone();
                let path = source.path.clone();

                // A panic in one file's stages must not take the run down.
                let report = match tokio::spawn(async move { worker.process(source).await }).await
                {
                    Ok(report) => report,
                    Err(e) => {
                        tracing::error!("Failed: {} - worker panicked: {}", file_name, e);
                        FileReport {
                            file_name,
                            thumbnail: None,
                            outcome: FileOutcome::Failed(PipelineError::Task {
                                path,
                                message: e.to_string(),
                            }),
                        }
                    }
                };
                (index, report)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, report)) => {
                    on_file(&report);
                    slots[index] = Some(report);
                }
                Err(e) => tracing::error!("Worker task failed: {}", e),
            }
        }

        slots
            .into_iter()
            .zip(identities)
            .map(|(slot, (file_name, path))| {
                slot.unwrap_or_else(|| {
                    let report = FileReport {
                        file_name,
                        thumbnail: None,
                        outcome: FileOutcome::Failed(PipelineError::Task {
                            path,
                            message: "worker task did not complete".to_string(),
                        }),
                    };
                    on_file(&report);
                    report
                })
            })
            .collect()
    }
}
