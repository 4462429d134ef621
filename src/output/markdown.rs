//! Markdown summary generation
//!
//! A short human-readable companion to the JSON report: run metadata, the
//! six summary maps as tables and the list of combinations that failed.

use super::traits::{OutputResult, ReportWriter};
use crate::types::{BenchmarkReport, SummaryMap};
use std::fs::File;
use std::io::Write;
use std::path::Path;

fn percent(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}

fn push_table(md: &mut String, title: &str, label: &str, rows: Vec<(&String, &f64)>) {
    if rows.is_empty() {
        return;
    }
    md.push_str(&format!("### {}\n\n", title));
    md.push_str(&format!("| {} | Accuracy |\n", label));
    md.push_str("|---|---|\n");
    for (name, score) in rows {
        md.push_str(&format!("| {} | {} |\n", name, percent(*score)));
    }
    md.push('\n');
}

fn by_name(map: &SummaryMap) -> Vec<(&String, &f64)> {
    map.iter().collect()
}

fn by_score(map: &SummaryMap) -> Vec<(&String, &f64)> {
    let mut rows: Vec<_> = map.iter().collect();
    rows.sort_by(|a, b| b.1.total_cmp(a.1));
    rows
}

/// Formats a benchmark report as markdown
pub fn format_markdown_summary(report: &BenchmarkReport) -> String {
    let mut md = String::new();

    md.push_str("# Scrape-Bench Results\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Timestamp**: {}\n", report.timestamp.to_rfc3339()));
    md.push_str(&format!("- **Domains Tested**: {}\n", report.total_domains));
    md.push_str(&format!("- **Combinations**: {}\n", report.total_combinations));
    if let Some(hash) = &report.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    md.push_str("## Value Accuracy\n\n");
    push_table(&mut md, "By Crawler", "Crawler", by_name(&report.summary_by_crawler));
    push_table(&mut md, "By LLM", "LLM", by_name(&report.summary_by_llm));
    push_table(&mut md, "By Combination", "Combination", by_score(&report.summary_by_combo));

    md.push_str("## Presence Accuracy\n\n");
    push_table(
        &mut md,
        "By Crawler",
        "Crawler",
        by_name(&report.summary_by_crawler_presence),
    );
    push_table(&mut md, "By LLM", "LLM", by_name(&report.summary_by_llm_presence));
    push_table(
        &mut md,
        "By Combination",
        "Combination",
        by_score(&report.summary_by_combo_presence),
    );

    let failures: Vec<_> = report.results.iter().filter(|r| !r.errors.is_empty()).collect();
    if !failures.is_empty() {
        md.push_str("## Errors\n\n");
        md.push_str("| Domain | Combination | Error |\n");
        md.push_str("|---|---|---|\n");
        for result in failures {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                result.domain,
                result.combo_key(),
                result.errors.join("; ").replace('|', "\\|")
            ));
        }
        md.push('\n');
    }

    md
}

/// Writes the markdown summary
pub struct MarkdownReportWriter;

impl ReportWriter for MarkdownReportWriter {
    fn extension(&self) -> &'static str {
        "md"
    }

    fn write(&self, report: &BenchmarkReport, path: &Path) -> OutputResult<()> {
        let markdown = format_markdown_summary(report);
        let mut file = File::create(path)?;
        file.write_all(markdown.as_bytes())?;
        Ok(())
    }
}
