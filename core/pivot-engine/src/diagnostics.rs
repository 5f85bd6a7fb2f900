//! FILENAME: core/pivot-engine/src/diagnostics.rs
//! Diagnostics sink handed to filter/aggregate calls.
//!
//! The core never talks to a logging backend directly. Callers pass a sink by
//! reference; the app routes it into its log file, tests collect it in memory.

use std::sync::Mutex;

/// Severity of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagnosticLevel {
    Debug,
    Warn,
}

/// Receives non-fatal findings from the pipeline.
///
/// Must be `Sync`: chunk aggregation may run on several worker threads.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, level: DiagnosticLevel, category: &str, message: &str);

    fn warn(&self, category: &str, message: &str) {
        self.emit(DiagnosticLevel::Warn, category, message);
    }

    fn debug(&self, category: &str, message: &str) {
        self.emit(DiagnosticLevel::Debug, category, message);
    }
}

/// Forwards diagnostics to the `log` facade, using the category as the target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDiagnostics;

impl DiagnosticSink for LogDiagnostics {
    fn emit(&self, level: DiagnosticLevel, category: &str, message: &str) {
        match level {
            DiagnosticLevel::Debug => log::debug!(target: category, "{}", message),
            DiagnosticLevel::Warn => log::warn!(target: category, "{}", message),
        }
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDiagnostics;

impl DiagnosticSink for NullDiagnostics {
    fn emit(&self, _level: DiagnosticLevel, _category: &str, _message: &str) {}
}

/// A recorded diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub category: String,
    pub message: String,
}

/// Keeps every diagnostic in memory, in emission order.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    entries: Mutex<Vec<Diagnostic>>,
}

impl CollectingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn warnings(&self) -> Vec<Diagnostic> {
        self.entries()
            .into_iter()
            .filter(|d| d.level == DiagnosticLevel::Warn)
            .collect()
    }
}

impl DiagnosticSink for CollectingDiagnostics {
    fn emit(&self, level: DiagnosticLevel, category: &str, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(Diagnostic {
                level,
                category: category.to_string(),
                message: message.to_string(),
            });
        }
    }
}
