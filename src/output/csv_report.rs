//! Flat CSV report, one row per combination

use super::traits::{round_to, OutputResult, ReportWriter};
use crate::extractor::schema::feature_names;
use crate::types::{BenchmarkReport, EvaluationResult};
use serde_json::Value;
use std::io::Write;
use std::path::Path;

const LEADING_COLUMNS: &[&str] = &[
    "domain",
    "crawler",
    "llm",
    "overall_accuracy",
    "features_found",
    "features_correct",
    "overall_presence_accuracy",
    "features_present_correct",
    "homepage_internal_links",
    "homepage_internal_links_crawled",
    "homepage_total_links",
    "homepage_external_links",
];

fn header() -> Vec<String> {
    let features = feature_names();
    let mut columns: Vec<String> = LEADING_COLUMNS.iter().map(|c| c.to_string()).collect();
    columns.extend(features.iter().map(|f| format!("{}_score", f)));
    columns.extend(features.iter().map(|f| format!("{}_extracted", f)));
    columns
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn row(result: &EvaluationResult) -> Vec<String> {
    let mut fields = vec![
        result.domain.clone(),
        result.crawler.clone(),
        result.llm.clone(),
        round_to(result.overall_accuracy, 4).to_string(),
        result.features_found.to_string(),
        result.features_correct.to_string(),
        round_to(result.overall_presence_accuracy, 4).to_string(),
        result.features_present_correct.to_string(),
        result.homepage_internal_links.to_string(),
        result.homepage_internal_links_crawled.to_string(),
        result.homepage_total_links.to_string(),
        result.homepage_external_links.to_string(),
    ];

    let features = feature_names();
    let score_of = |name: &str| result.feature_scores.iter().find(|fs| fs.feature_name == name);

    for name in &features {
        fields.push(
            score_of(name)
                .map(|fs| round_to(fs.score, 2).to_string())
                .unwrap_or_default(),
        );
    }
    for name in &features {
        fields.push(score_of(name).map(|fs| cell(&fs.extracted_value)).unwrap_or_default());
    }
    fields
}

/// Writes every result as CSV to any writer
pub fn write_csv_report<W: Write>(report: &BenchmarkReport, out: W) -> OutputResult<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(header())?;
    for result in &report.results {
        writer.write_record(row(result))?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the per-combination CSV report
pub struct CsvReportWriter;

impl ReportWriter for CsvReportWriter {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn write(&self, report: &BenchmarkReport, path: &Path) -> OutputResult<()> {
        let file = std::fs::File::create(path)?;
        write_csv_report(report, file)
    }
}
