//! FILENAME: app/src/lib.rs
// PURPOSE: pivot-table application: configuration, discovery, run loop, logging.

pub mod cli;
pub mod config;
pub mod discovery;
pub mod logging;
pub mod runner;

pub use cli::Cli;
pub use config::{Config, Overrides};
pub use discovery::{find_input_files, output_path_for};
pub use logging::{get_log_path, init_log_file, install_logger, next_seq, write_log};
pub use runner::{process_file, run, FileFailure, FileReport, RunSummary};

use anyhow::{Context, Result};

/// Loads the configuration, opens the run log and processes every input file.
pub fn run_cli(cli: &Cli) -> Result<RunSummary> {
    let mut config = Config::load(&cli.config)?;
    config.apply_overrides(&cli.overrides())?;

    init_log_file(&config.log_file)
        .with_context(|| format!("Failed to open log file {}", config.log_file.display()))?;
    install_logger(cli.verbose);

    log_enter_info!(
        "RUN",
        "run_cli",
        "config={} at {}",
        cli.config.display(),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    let summary = run(&config)?;
    log_exit_info!(
        "RUN",
        "run_cli",
        "{}/{} files succeeded",
        summary.processed.len(),
        summary.total_files()
    );
    Ok(summary)
}
