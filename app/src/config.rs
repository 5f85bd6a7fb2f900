//! FILENAME: app/src/config.rs
//! Run configuration, loaded from a TOML file and adjusted by CLI flags.

use anyhow::{bail, Context, Result};
use pivot_engine::{AdditionalFilters, FilterSpec, PipelineOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_LOG_FILE: &str = "pivot_table.log";

fn default_true() -> bool {
    true
}

fn default_delimiter() -> char {
    ','
}

fn default_extension() -> String {
    "csv".to_string()
}

fn default_log_file() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_FILE)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Walked recursively for input files.
    pub input_folder: PathBuf,

    /// Mirrors the input folder's layout.
    pub output_folder: PathBuf,

    pub main_column: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_column_exclude: Option<String>,

    pub secondary_column: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_column_exclude: Option<String>,

    /// Column -> full-match pattern, applied in file order.
    #[serde(default)]
    pub additional_filters: AdditionalFilters,

    #[serde(default = "default_true")]
    pub merge_output_cells: bool,

    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Input file extension, without the dot.
    #[serde(default = "default_extension")]
    pub extension: String,

    #[serde(default)]
    pub pipeline: PipelineOptions,

    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

/// CLI values that replace configuration entries when present.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub input_folder: Option<PathBuf>,
    pub output_folder: Option<PathBuf>,
    pub workers: Option<usize>,
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Config::from_toml(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Config> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) -> Result<()> {
        if let Some(ref input) = overrides.input_folder {
            self.input_folder = input.clone();
        }
        if let Some(ref output) = overrides.output_folder {
            self.output_folder = output.clone();
        }
        if let Some(workers) = overrides.workers {
            self.pipeline.workers = workers;
        }
        if let Some(ref log_file) = overrides.log_file {
            self.log_file = log_file.clone();
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.main_column.is_empty() {
            bail!("main_column must not be empty");
        }
        if self.secondary_column.is_empty() {
            bail!("secondary_column must not be empty");
        }
        if !self.delimiter.is_ascii() {
            bail!("delimiter must be a single ASCII character, got {:?}", self.delimiter);
        }
        if self.extension.is_empty() {
            bail!("extension must not be empty");
        }
        self.pipeline.validate()?;
        Ok(())
    }

    /// The delimiter as a byte. `validate` guarantees it is ASCII.
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter as u8
    }

    pub fn filter_spec(&self) -> FilterSpec {
        FilterSpec {
            main_column: self.main_column.clone(),
            main_exclude: self.main_column_exclude.clone(),
            secondary_column: self.secondary_column.clone(),
            secondary_exclude: self.secondary_column_exclude.clone(),
            additional_filters: self.additional_filters.clone(),
        }
    }
}
