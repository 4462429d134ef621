use crate::types::{BenchmarkReport, EvaluationResult, SummaryMap};
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};

/// Mean accuracies grouped three ways, for values and for presence
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summaries {
    pub by_crawler: SummaryMap,
    pub by_llm: SummaryMap,
    pub by_combo: SummaryMap,
    pub by_crawler_presence: SummaryMap,
    pub by_llm_presence: SummaryMap,
    pub by_combo_presence: SummaryMap,
}

#[derive(Default)]
struct Groups(BTreeMap<String, Vec<f64>>);

impl Groups {
    fn add(&mut self, key: &str, value: f64) {
        self.0.entry(key.to_string()).or_default().push(value);
    }

    fn means(self) -> SummaryMap {
        self.0
            .into_iter()
            .map(|(key, values)| {
                let mean = if values.is_empty() {
                    0.0
                } else {
                    values.iter().sum::<f64>() / values.len() as f64
                };
                (key, mean)
            })
            .collect()
    }
}

/// Groups results by crawler, by LLM and by `crawler+llm`
pub fn compute_summary(results: &[EvaluationResult]) -> Summaries {
    let mut crawler = Groups::default();
    let mut llm = Groups::default();
    let mut combo = Groups::default();
    let mut crawler_presence = Groups::default();
    let mut llm_presence = Groups::default();
    let mut combo_presence = Groups::default();

    for result in results {
        let key = result.combo_key();
        crawler.add(&result.crawler, result.overall_accuracy);
        llm.add(&result.llm, result.overall_accuracy);
        combo.add(&key, result.overall_accuracy);
        crawler_presence.add(&result.crawler, result.overall_presence_accuracy);
        llm_presence.add(&result.llm, result.overall_presence_accuracy);
        combo_presence.add(&key, result.overall_presence_accuracy);
    }

    Summaries {
        by_crawler: crawler.means(),
        by_llm: llm.means(),
        by_combo: combo.means(),
        by_crawler_presence: crawler_presence.means(),
        by_llm_presence: llm_presence.means(),
        by_combo_presence: combo_presence.means(),
    }
}

/// Wraps results and their summaries into a report stamped now
pub fn build_report(results: Vec<EvaluationResult>, config_hash: Option<String>) -> BenchmarkReport {
    let summaries = compute_summary(&results);
    let domains: BTreeSet<&str> = results.iter().map(|r| r.domain.as_str()).collect();

    BenchmarkReport {
        timestamp: Utc::now(),
        total_domains: domains.len(),
        total_combinations: results.len(),
        summary_by_crawler: summaries.by_crawler,
        summary_by_llm: summaries.by_llm,
        summary_by_combo: summaries.by_combo,
        summary_by_crawler_presence: summaries.by_crawler_presence,
        summary_by_llm_presence: summaries.by_llm_presence,
        summary_by_combo_presence: summaries.by_combo_presence,
        results,
        config_hash,
    }
}
