//! JSON benchmark report
//!
//! Scores are rounded for readability: overall accuracies to four places,
//! per-feature scores to two. Feature and presence scores are keyed by
//! feature name in evaluation order.

use super::traits::{round_to, OutputResult, ReportWriter};
use crate::types::{BenchmarkReport, EvaluationResult, SummaryMap};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Serialize)]
struct ReportDocument<'a> {
    timestamp: String,
    total_domains: usize,
    total_combinations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    config_hash: Option<&'a str>,
    summary_by_crawler: &'a SummaryMap,
    summary_by_llm: &'a SummaryMap,
    summary_by_combo: &'a SummaryMap,
    summary_by_crawler_presence: &'a SummaryMap,
    summary_by_llm_presence: &'a SummaryMap,
    summary_by_combo_presence: &'a SummaryMap,
    results: Vec<ResultRecord<'a>>,
}

#[derive(Serialize)]
struct ResultRecord<'a> {
    domain: &'a str,
    crawler: &'a str,
    llm: &'a str,
    overall_accuracy: f64,
    features_found: usize,
    features_correct: usize,
    overall_presence_accuracy: f64,
    features_present_correct: usize,
    crawl_link_stats: LinkStats,
    feature_scores: IndexMap<&'a str, FeatureRecord<'a>>,
    presence_scores: IndexMap<&'a str, PresenceRecord<'a>>,
    errors: &'a [String],
}

#[derive(Serialize)]
struct LinkStats {
    homepage_internal_links: usize,
    homepage_internal_links_crawled: usize,
    homepage_total_links: usize,
    homepage_external_links: usize,
}

#[derive(Serialize)]
struct FeatureRecord<'a> {
    score: f64,
    match_type: &'a str,
    extracted: &'a Value,
    ground_truth: &'a Value,
}

#[derive(Serialize)]
struct PresenceRecord<'a> {
    score: f64,
    match_type: &'a str,
    extracted_present: bool,
    ground_truth_present: bool,
}

impl<'a> From<&'a EvaluationResult> for ResultRecord<'a> {
    fn from(result: &'a EvaluationResult) -> Self {
        let feature_scores = result
            .feature_scores
            .iter()
            .map(|fs| {
                (
                    fs.feature_name.as_str(),
                    FeatureRecord {
                        score: round_to(fs.score, 2),
                        match_type: &fs.match_type,
                        extracted: &fs.extracted_value,
                        ground_truth: &fs.ground_truth_value,
                    },
                )
            })
            .collect();

        let presence_scores = result
            .presence_scores
            .iter()
            .map(|ps| {
                (
                    ps.feature_name.as_str(),
                    PresenceRecord {
                        score: ps.score,
                        match_type: &ps.match_type,
                        extracted_present: ps.extracted_present,
                        ground_truth_present: ps.ground_truth_present,
                    },
                )
            })
            .collect();

        Self {
            domain: &result.domain,
            crawler: &result.crawler,
            llm: &result.llm,
            overall_accuracy: round_to(result.overall_accuracy, 4),
            features_found: result.features_found,
            features_correct: result.features_correct,
            overall_presence_accuracy: round_to(result.overall_presence_accuracy, 4),
            features_present_correct: result.features_present_correct,
            crawl_link_stats: LinkStats {
                homepage_internal_links: result.homepage_internal_links,
                homepage_internal_links_crawled: result.homepage_internal_links_crawled,
                homepage_total_links: result.homepage_total_links,
                homepage_external_links: result.homepage_external_links,
            },
            feature_scores,
            presence_scores,
            errors: &result.errors,
        }
    }
}

/// Renders a report as a pretty-printed JSON string
pub fn format_json_report(report: &BenchmarkReport) -> OutputResult<String> {
    let document = ReportDocument {
        timestamp: report.timestamp.to_rfc3339(),
        total_domains: report.total_domains,
        total_combinations: report.total_combinations,
        config_hash: report.config_hash.as_deref(),
        summary_by_crawler: &report.summary_by_crawler,
        summary_by_llm: &report.summary_by_llm,
        summary_by_combo: &report.summary_by_combo,
        summary_by_crawler_presence: &report.summary_by_crawler_presence,
        summary_by_llm_presence: &report.summary_by_llm_presence,
        summary_by_combo_presence: &report.summary_by_combo_presence,
        results: report.results.iter().map(ResultRecord::from).collect(),
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Writes the full JSON report
pub struct JsonReportWriter;

impl ReportWriter for JsonReportWriter {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn write(&self, report: &BenchmarkReport, path: &Path) -> OutputResult<()> {
        let json = format_json_report(report)?;
        let mut out = BufWriter::new(File::create(path)?);
        out.write_all(json.as_bytes())?;
        out.flush()?;
        Ok(())
    }
}
