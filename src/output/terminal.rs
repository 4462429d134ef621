//! Terminal summary with bar charts

use crate::types::{BenchmarkReport, SummaryMap};
use std::fmt::Write;

const BAR_WIDTH: usize = 30;
const RULE_WIDTH: usize = 70;

fn bar(score: f64) -> String {
    let filled = ((score * BAR_WIDTH as f64) as usize).min(BAR_WIDTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

fn section(out: &mut String, title: &str, map: &SummaryMap, combos: bool) {
    let _ = writeln!(out, "  {}:", title);
    if combos {
        let mut rows: Vec<_> = map.iter().collect();
        rows.sort_by(|a, b| b.1.total_cmp(a.1));
        for (name, score) in rows {
            let _ = writeln!(out, "    {:<22} {} {:.1}%", name, bar(*score), score * 100.0);
        }
    } else {
        for (name, score) in map {
            let _ = writeln!(out, "    {:<12} {} {:.1}%", name, bar(*score), score * 100.0);
        }
    }
}

/// Renders the summary block printed at the end of a run
pub fn format_summary(report: &BenchmarkReport) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    let _ = writeln!(out, "\n{}", rule);
    let _ = writeln!(out, "  BENCHMARK RESULTS SUMMARY");
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "  Domains tested:  {}", report.total_domains);
    let _ = writeln!(out, "  Combinations:    {}", report.total_combinations);
    out.push('\n');

    let sections = [
        ("Value Accuracy by Crawler", &report.summary_by_crawler, false),
        ("Value Accuracy by LLM", &report.summary_by_llm, false),
        ("Value Accuracy by Combination", &report.summary_by_combo, true),
        ("Presence Accuracy by Crawler", &report.summary_by_crawler_presence, false),
        ("Presence Accuracy by LLM", &report.summary_by_llm_presence, false),
        ("Presence Accuracy by Combination", &report.summary_by_combo_presence, true),
    ];
    for (i, (title, map, combos)) in sections.into_iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        section(&mut out, title, map, combos);
    }

    let _ = writeln!(out, "{}", rule);
    out
}

/// Prints the summary to stdout
pub fn print_summary(report: &BenchmarkReport) {
    println!("{}", format_summary(report));
}
