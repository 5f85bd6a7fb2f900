//! FILENAME: app/src/main.rs
// PURPOSE: Command-line entry point.
// FORMAT: seq|level|category|message

use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = app_lib::Cli::parse();
    match app_lib::run_cli(&cli) {
        Ok(summary) if summary.is_success() => ExitCode::SUCCESS,
        Ok(summary) => {
            eprintln!(
                "{} of {} files failed, see the log for details",
                summary.failed.len(),
                summary.total_files()
            );
            ExitCode::FAILURE
        }
        Err(e) => {
            app_lib::log_error!("RUN", "{:#}", e);
            ExitCode::from(2)
        }
    }
}
