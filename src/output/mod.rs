//! Output module for benchmark reports
//!
//! This module handles:
//! - Writing the JSON report and the flat CSV export
//! - Generating a markdown summary next to them
//! - Printing the bar-chart summary to the terminal

mod csv_report;
mod json;
mod markdown;
mod terminal;
mod traits;

pub use csv_report::{write_csv_report, CsvReportWriter};
pub use json::{format_json_report, JsonReportWriter};
pub use markdown::{format_markdown_summary, MarkdownReportWriter};
pub use terminal::{format_summary, print_summary};
pub use traits::{OutputError, OutputResult, ReportWriter};

use crate::types::BenchmarkReport;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Which machine-readable reports to write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Json,
    Csv,
    All,
}

impl ReportFormat {
    fn writers(self) -> Vec<Box<dyn ReportWriter>> {
        let mut writers: Vec<Box<dyn ReportWriter>> = Vec::new();
        if matches!(self, ReportFormat::Json | ReportFormat::All) {
            writers.push(Box::new(JsonReportWriter));
        }
        if matches!(self, ReportFormat::Csv | ReportFormat::All) {
            writers.push(Box::new(CsvReportWriter));
        }
        writers.push(Box::new(MarkdownReportWriter));
        writers
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "csv" => Ok(ReportFormat::Csv),
            "all" => Ok(ReportFormat::All),
            other => Err(format!("unknown report format: {}", other)),
        }
    }
}

/// File stem shared by every report of one run, e.g. `benchmark_20250101_120000`
pub fn report_stem(report: &BenchmarkReport) -> String {
    format!("benchmark_{}", report.timestamp.format("%Y%m%d_%H%M%S"))
}

/// Writes the report in the requested formats plus a markdown summary
///
/// # Returns
///
/// The paths written, in write order
pub fn save_results(
    report: &BenchmarkReport,
    output_dir: &Path,
    format: ReportFormat,
) -> OutputResult<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;
    let stem = report_stem(report);

    let mut written = Vec::new();
    for writer in format.writers() {
        let path = output_dir.join(format!("{}.{}", stem, writer.extension()));
        writer.write(report, &path)?;
        written.push(path);
    }

    info!(dir = %output_dir.display(), files = written.len(), "Results saved");
    Ok(written)
}
