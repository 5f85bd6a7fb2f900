//! FILENAME: app/src/cli.rs

use crate::config::{Overrides, DEFAULT_CONFIG_PATH};
use clap::Parser;
use std::path::PathBuf;

/// Builds filtered (main, secondary) count tables from CSV exports.
#[derive(Debug, Parser)]
#[command(name = "pivot-table", version, about)]
pub struct Cli {
    /// Configuration file (TOML).
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Overrides `input_folder`.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Overrides `output_folder`.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Chunks aggregated in parallel.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Overrides `log_file`.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Also log debug lines.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            input_folder: self.input.clone(),
            output_folder: self.output.clone(),
            workers: self.workers,
            log_file: self.log_file.clone(),
        }
    }
}
