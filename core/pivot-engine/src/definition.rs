//! FILENAME: core/pivot-engine/src/definition.rs
//! Pivot Definition - The serializable configuration.
//!
//! This module contains the types that DESCRIBE a count pivot:
//! - `FilterSpec`: which columns form the key and which rows to drop
//! - `PipelineOptions`: how the input is read (whole file or chunked)
//! - `CompiledFilter`: a validated `FilterSpec` with its patterns compiled
//!
//! A `FilterSpec` is an immutable value built once per run; compiling it is the
//! only place a pattern can fail, so no regex error can surface mid-stream.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PivotError;

/// Rows per chunk when the input is streamed.
pub const DEFAULT_CHUNK_ROWS: usize = 100_000;

/// Inputs at or above this size are streamed in chunks (100 MiB).
pub const DEFAULT_CHUNK_THRESHOLD_BYTES: u64 = 100 << 20;

/// Ordered `column -> pattern` inclusion filters.
///
/// Document order is the evaluation order. A column named twice keeps its last
/// pattern at its first position.
pub type AdditionalFilters = IndexMap<String, String>;

// ============================================================================
// FILTER SPEC
// ============================================================================

/// The rules deciding which rows are counted and under which key.
///
/// Exclusion patterns use substring semantics (a match anywhere drops the row).
/// Additional filters are inclusion filters with full-match semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Outer index column.
    pub main_column: String,

    /// Rows whose main value contains a match are dropped.
    #[serde(default)]
    pub main_exclude: Option<String>,

    /// Inner index column, also the counted column.
    pub secondary_column: String,

    /// Rows whose secondary value contains a match are dropped.
    #[serde(default)]
    pub secondary_exclude: Option<String>,

    #[serde(default)]
    pub additional_filters: AdditionalFilters,
}

impl FilterSpec {
    pub fn new(main_column: impl Into<String>, secondary_column: impl Into<String>) -> Self {
        FilterSpec {
            main_column: main_column.into(),
            main_exclude: None,
            secondary_column: secondary_column.into(),
            secondary_exclude: None,
            additional_filters: AdditionalFilters::new(),
        }
    }

    pub fn with_main_exclude(mut self, pattern: impl Into<String>) -> Self {
        self.main_exclude = Some(pattern.into());
        self
    }

    pub fn with_secondary_exclude(mut self, pattern: impl Into<String>) -> Self {
        self.secondary_exclude = Some(pattern.into());
        self
    }

    pub fn with_filter(mut self, column: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.additional_filters.insert(column.into(), pattern.into());
        self
    }

    /// Header of the single data column in the output table.
    pub fn count_column_name(&self) -> String {
        format!("Count of {}", self.secondary_column)
    }

    /// Checks the column names and compiles every pattern.
    pub fn compile(&self) -> Result<CompiledFilter, PivotError> {
        if self.main_column.is_empty() {
            return Err(PivotError::InvalidOptions("main_column is empty".to_string()));
        }
        if self.secondary_column.is_empty() {
            return Err(PivotError::InvalidOptions("secondary_column is empty".to_string()));
        }

        let main_exclude = compile_exclude("main_exclude", self.main_exclude.as_deref())?;
        let secondary_exclude =
            compile_exclude("secondary_exclude", self.secondary_exclude.as_deref())?;

        let additional = self
            .additional_filters
            .iter()
            .map(|(column, pattern)| FullMatch::new(column, pattern))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CompiledFilter {
            spec: self.clone(),
            main_exclude,
            secondary_exclude,
            additional,
        })
    }
}

/// An empty exclusion pattern means "not set".
fn compile_exclude(field: &str, pattern: Option<&str>) -> Result<Option<Regex>, PivotError> {
    match pattern {
        None | Some("") => Ok(None),
        Some(p) => Regex::new(p).map(Some).map_err(|source| PivotError::InvalidPattern {
            field: field.to_string(),
            pattern: p.to_string(),
            source,
        }),
    }
}

// ============================================================================
// COMPILED FILTER
// ============================================================================

/// An inclusion filter anchored at both ends.
#[derive(Debug, Clone)]
pub struct FullMatch {
    column: String,
    pattern: String,
    regex: Regex,
    matches_empty: bool,
}

impl FullMatch {
    fn new(column: &str, pattern: &str) -> Result<Self, PivotError> {
        let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| {
            PivotError::InvalidPattern {
                field: format!("additional_filters.{}", column),
                pattern: pattern.to_string(),
                source,
            }
        })?;
        let matches_empty = regex.is_match("");
        Ok(FullMatch {
            column: column.to_string(),
            pattern: pattern.to_string(),
            regex,
            matches_empty,
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_full_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    /// Whether a blank value passes this filter.
    pub fn matches_empty(&self) -> bool {
        self.matches_empty
    }
}

/// A validated `FilterSpec`. Cheap to share across worker threads.
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    spec: FilterSpec,
    main_exclude: Option<Regex>,
    secondary_exclude: Option<Regex>,
    additional: Vec<FullMatch>,
}

impl CompiledFilter {
    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    pub fn additional(&self) -> &[FullMatch] {
        &self.additional
    }

    /// Substring exclusion on the main column. Empty values never match.
    pub fn excludes_main(&self, value: &str) -> bool {
        excludes(self.main_exclude.as_ref(), value)
    }

    /// Substring exclusion on the secondary column. Empty values never match.
    pub fn excludes_secondary(&self, value: &str) -> bool {
        excludes(self.secondary_exclude.as_ref(), value)
    }
}

fn excludes(pattern: Option<&Regex>, value: &str) -> bool {
    match pattern {
        Some(re) => !value.is_empty() && re.is_match(value),
        None => false,
    }
}

// ============================================================================
// PIPELINE OPTIONS
// ============================================================================

/// Controls how an input is read. Has no effect on the resulting counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Maximum records per chunk in streaming mode.
    pub chunk_rows: usize,

    /// Inputs of at least this many bytes are streamed.
    pub chunk_threshold_bytes: u64,

    /// Chunks aggregated in parallel. 1 keeps the pipeline single-threaded.
    pub workers: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            chunk_rows: DEFAULT_CHUNK_ROWS,
            chunk_threshold_bytes: DEFAULT_CHUNK_THRESHOLD_BYTES,
            workers: 1,
        }
    }
}

impl PipelineOptions {
    pub fn validate(&self) -> Result<(), PivotError> {
        if self.chunk_rows == 0 {
            return Err(PivotError::InvalidOptions("chunk_rows must be at least 1".to_string()));
        }
        if self.workers == 0 {
            return Err(PivotError::InvalidOptions("workers must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusion_uses_substring_semantics() {
        let compiled = FilterSpec::new("Destination", "Anchor")
            .with_main_exclude(r"14-carat\/|925\/")
            .compile()
            .unwrap();

        assert!(compiled.excludes_main("Jewelry/14-carat/Rings"));
        assert!(!compiled.excludes_main("Jewelry/Rings"));
        assert!(!compiled.excludes_main(""));
    }

    #[test]
    fn test_additional_filter_requires_full_match() {
        let compiled = FilterSpec::new("Destination", "Anchor")
            .with_filter("Follow", "Yes|No")
            .compile()
            .unwrap();

        let follow = &compiled.additional()[0];
        assert!(follow.is_full_match("Yes"));
        assert!(follow.is_full_match("No"));
        assert!(!follow.is_full_match("Yes please"));
        assert!(!follow.matches_empty());
    }

    #[test]
    fn test_empty_exclude_pattern_is_unset() {
        let compiled = FilterSpec::new("A", "B")
            .with_secondary_exclude("")
            .compile()
            .unwrap();
        assert!(!compiled.excludes_secondary("anything"));
    }

    #[test]
    fn test_malformed_pattern_fails_at_compile_time() {
        let err = FilterSpec::new("A", "B")
            .with_filter("Follow", "(true")
            .compile()
            .unwrap_err();

        match err {
            PivotError::InvalidPattern { field, .. } => {
                assert_eq!(field, "additional_filters.Follow");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_required_columns_must_be_named() {
        assert!(FilterSpec::new("", "Anchor").compile().is_err());
        assert!(FilterSpec::new("Destination", "").compile().is_err());
    }

    #[test]
    fn test_additional_filters_keep_document_order() {
        let spec: FilterSpec = toml::from_str(
            r#"
            main_column = "Destination"
            secondary_column = "Anchor"

            [additional_filters]
            Zeta = "z"
            Alpha = "a"
            Follow = "true|false"
            "#,
        )
        .unwrap();

        let columns: Vec<&str> = spec.additional_filters.keys().map(String::as_str).collect();
        assert_eq!(columns, vec!["Zeta", "Alpha", "Follow"]);
        assert_eq!(spec.count_column_name(), "Count of Anchor");
    }

    #[test]
    fn test_repeated_filter_column_keeps_last_pattern() {
        let spec: FilterSpec = serde_json::from_str(
            r#"{
                "main_column": "Destination",
                "secondary_column": "Anchor",
                "additional_filters": {"Follow": "true", "Rel": "x", "Follow": "false"}
            }"#,
        )
        .unwrap();

        let filters: Vec<(&str, &str)> = spec
            .additional_filters
            .iter()
            .map(|(c, p)| (c.as_str(), p.as_str()))
            .collect();
        assert_eq!(filters, vec![("Follow", "false"), ("Rel", "x")]);

        let compiled = spec.compile().unwrap();
        assert_eq!(compiled.additional().len(), 2);
        assert!(compiled.additional()[0].is_full_match("false"));
        assert!(!compiled.additional()[0].is_full_match("true"));
    }

    #[test]
    fn test_with_filter_replaces_existing_column() {
        let spec = FilterSpec::new("Destination", "Anchor")
            .with_filter("Follow", "true")
            .with_filter("Follow", "false");
        assert_eq!(spec.additional_filters.len(), 1);
        assert_eq!(spec.additional_filters.get("Follow").map(String::as_str), Some("false"));
    }

    #[test]
    fn test_pipeline_options_validation() {
        assert!(PipelineOptions::default().validate().is_ok());
        let zero_rows = PipelineOptions { chunk_rows: 0, ..Default::default() };
        assert!(zero_rows.validate().is_err());
        let zero_workers = PipelineOptions { workers: 0, ..Default::default() };
        assert!(zero_workers.validate().is_err());
    }
}
