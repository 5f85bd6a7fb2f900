//! FILENAME: app/src/runner.rs
//! The per-file loop: discover inputs, pivot each one, write its workbook.
//!
//! A failing file is logged and skipped; the remaining files are still processed.

use crate::config::Config;
use crate::discovery::{find_input_files, output_path_for};
use crate::{log_debug, log_error, log_info};
use anyhow::{Context, Result};
use persistence::{pivot_csv_file, save_pivot_xlsx, CsvOptions};
use pivot_engine::{CompiledFilter, LogDiagnostics, PivotStats, PivotView};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// One successfully processed input.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub stats: PivotStats,
    /// Distinct (main, secondary) keys written.
    pub keys: usize,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub struct FileFailure {
    pub input: PathBuf,
    pub error: anyhow::Error,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub processed: Vec<FileReport>,
    pub failed: Vec<FileFailure>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total_files(&self) -> usize {
        self.processed.len() + self.failed.len()
    }
}

/// Pivots one input file and writes its workbook to `output`.
pub fn process_file(
    input: &Path,
    output: &Path,
    filter: &CompiledFilter,
    config: &Config,
) -> Result<FileReport> {
    let started = Instant::now();
    let csv_options = CsvOptions {
        delimiter: config.delimiter_byte(),
    };

    let outcome = pivot_csv_file(input, filter, &config.pipeline, &csv_options, &LogDiagnostics)
        .with_context(|| format!("Failed to pivot {}", input.display()))?;
    log_debug!(
        "PIPELINE",
        "{}: route {:?}, {} chunks, {} rows read, {} rows counted",
        input.display(),
        outcome.stats.route,
        outcome.stats.chunks,
        outcome.stats.rows_read,
        outcome.stats.rows_counted
    );

    let view = PivotView::from_table(&outcome.table, filter.spec(), config.merge_output_cells);
    save_pivot_xlsx(&view, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(FileReport {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        stats: outcome.stats,
        keys: view.rows.len(),
        elapsed: started.elapsed(),
    })
}

/// Processes every input file under the configured input folder.
///
/// Fails only when the run cannot start (bad filter patterns, missing input
/// folder). Per-file errors are collected in the summary.
pub fn run(config: &Config) -> Result<RunSummary> {
    let filter = config
        .filter_spec()
        .compile()
        .context("Invalid filter configuration")?;

    let files = find_input_files(&config.input_folder, &config.extension)?;
    log_info!(
        "RUN",
        "Found {} .{} files under {}",
        files.len(),
        config.extension,
        config.input_folder.display()
    );

    let mut summary = RunSummary::default();
    for input in files {
        let output = output_path_for(&input, &config.input_folder, &config.output_folder);
        log_info!("FILE", "Processing file: {}", input.display());

        match process_file(&input, &output, &filter, config) {
            Ok(report) => {
                log_info!(
                    "FILE",
                    "Pivot table saved to {} ({} keys, {} rows counted, {:.2?})",
                    report.output.display(),
                    report.keys,
                    report.stats.rows_counted,
                    report.elapsed
                );
                summary.processed.push(report);
            }
            Err(error) => {
                log_error!("FILE", "Error processing file {}: {:#}", input.display(), error);
                summary.failed.push(FileFailure { input, error });
            }
        }
    }

    log_info!(
        "RUN",
        "Done: {} processed, {} failed",
        summary.processed.len(),
        summary.failed.len()
    );
    Ok(summary)
}
