//! Report writer trait and error types

use crate::types::BenchmarkReport;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while writing reports
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write CSV report: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A format a finished benchmark report can be saved in
pub trait ReportWriter {
    /// File extension used for this format, without the dot
    fn extension(&self) -> &'static str;

    /// Writes the report to `path`
    fn write(&self, report: &BenchmarkReport, path: &Path) -> OutputResult<()>;
}

/// Rounds to a fixed number of decimal places
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
