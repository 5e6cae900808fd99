//! The default command: generate thumbnails and write the photo index.

use std::fmt::Write as _;

use indicatif::{ProgressBar, ProgressStyle};
use pinmap_core::{Config, FileOutcome, Pipeline, RunSummary};

/// Execute a full ingestion run with a progress bar and a final summary.
///
/// Excluded files never fail the command. Only an unreadable images
/// directory or a failed index write do.
pub async fn execute(config: Config) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(&config);

    let sources = pipeline.discover()?;
    let progress = create_progress_bar(sources.len() as u64)?;

    let result = pipeline
        .run_sources(sources, |report| {
            progress.inc(1);
            let label = match &report.outcome {
                FileOutcome::Included(_) => "indexed",
                FileOutcome::NoGeotag { .. } => "no GPS",
                FileOutcome::Failed(_) => "failed",
            };
            progress.set_message(format!("{} ({label})", report.file_name));
        })
        .await;
    progress.finish_and_clear();

    let summary = result?;
    eprint!("{}", format_summary(&summary));
    Ok(())
}

/// Create a progress bar for the per-file stages.
fn create_progress_bar(total: u64) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )?
            .progress_chars("##-"),
    );
    pb.set_message("starting...");
    Ok(pb)
}

/// Format the summary table and the list of excluded files.
fn format_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let secs = summary.elapsed.as_secs_f64();

    // Writing to a String cannot fail.
    let _ = writeln!(out);
    let _ = writeln!(out, "  ====================================");
    let _ = writeln!(out, "               Summary");
    let _ = writeln!(out, "  ====================================");
    let _ = writeln!(out, "    Included:     {:>8}", summary.included);
    if !summary.excluded_no_gps.is_empty() {
        let _ = writeln!(out, "    No GPS:       {:>8}", summary.excluded_no_gps.len());
    }
    if !summary.excluded_error.is_empty() {
        let _ = writeln!(out, "    Failed:       {:>8}", summary.excluded_error.len());
    }
    let _ = writeln!(out, "  ------------------------------------");
    let _ = writeln!(out, "    Total:        {:>8}", summary.total());
    let _ = writeln!(out, "    Thumbnails:   {:>8} new", summary.thumbnails_created);
    let _ = writeln!(out, "                  {:>8} cached", summary.thumbnails_cached);
    if summary.thumbnail_fallbacks > 0 {
        let _ = writeln!(
            out,
            "                  {:>8} using original",
            summary.thumbnail_fallbacks
        );
    }
    let _ = writeln!(out, "    Duration:     {:>7.1}s", secs);
    let _ = writeln!(out, "  ====================================");
    let _ = writeln!(out, "    Index: {}", summary.output_path.display());

    let excluded: Vec<_> = summary
        .excluded_error
        .iter()
        .chain(&summary.excluded_no_gps)
        .collect();
    if !excluded.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "  Excluded:");
        let width = excluded.iter().map(|e| e.file_name.len()).max().unwrap_or(0);
        for exclusion in excluded {
            let _ = writeln!(
                out,
                "    {:<width$}  {}",
                exclusion.file_name, exclusion.reason
            );
        }
    }
    out
}
