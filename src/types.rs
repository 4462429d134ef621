//! Shared data model
//!
//! Every value that crosses a pipeline stage boundary lives here. All of them
//! serialize to plain JSON so cached artifacts stay human-diffable.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Separator placed between pages in a combined document
pub const PAGE_SEPARATOR: &str = "\n\n---\n\n";

/// Output of crawling one domain with one backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlResult {
    pub domain: String,
    pub crawler: String,
    pub raw_content: String,
    /// Page name to page text, in crawl order
    pub page_contents: IndexMap<String, String>,
    pub crawled_at: DateTime<Utc>,
    #[serde(default)]
    pub homepage_internal_links: usize,
    #[serde(default)]
    pub homepage_total_links: usize,
    #[serde(default)]
    pub homepage_external_links: usize,
    #[serde(default)]
    pub homepage_internal_links_crawled: usize,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub duration_seconds: f64,
}

impl CrawlResult {
    /// Builds an empty result that only carries an error
    ///
    /// Used when a backend cannot be constructed or its crawl task dies.
    pub fn failed(domain: &str, crawler: &str, error: impl Into<String>) -> Self {
        Self {
            domain: domain.to_string(),
            crawler: crawler.to_string(),
            raw_content: String::new(),
            page_contents: IndexMap::new(),
            crawled_at: Utc::now(),
            homepage_internal_links: 0,
            homepage_total_links: 0,
            homepage_external_links: 0,
            homepage_internal_links_crawled: 0,
            error: Some(error.into()),
            duration_seconds: 0.0,
        }
    }

    /// True when the crawl produced nothing usable
    pub fn is_total_failure(&self) -> bool {
        self.error.is_some() && self.raw_content.is_empty()
    }
}

/// Cleaned, size-capped content ready for an extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedContent {
    pub domain: String,
    pub crawler: String,
    pub markdown: String,
    pub page_sections: IndexMap<String, String>,
    pub char_count: usize,
}

/// Feature values produced by one extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFeatures {
    pub domain: String,
    pub crawler: String,
    pub llm: String,
    pub extracted_at: DateTime<Utc>,
    pub features: BTreeMap<String, Value>,
    #[serde(default)]
    pub raw_llm_response: String,
    #[serde(default)]
    pub error: Option<String>,
}

impl ExtractedFeatures {
    /// Builds a result with every feature set to null and the error recorded
    pub fn failed<'a>(
        parsed: &ParsedContent,
        llm: &str,
        feature_names: impl IntoIterator<Item = &'a str>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            domain: parsed.domain.clone(),
            crawler: parsed.crawler.clone(),
            llm: llm.to_string(),
            extracted_at: Utc::now(),
            features: feature_names
                .into_iter()
                .map(|name| (name.to_string(), Value::Null))
                .collect(),
            raw_llm_response: String::new(),
            error: Some(error.into()),
        }
    }
}

/// Score for one feature's value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScore {
    pub feature_name: String,
    pub extracted_value: Value,
    pub ground_truth_value: Value,
    pub score: f64,
    pub match_type: String,
}

/// Score for whether a feature's presence was predicted correctly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceScore {
    pub feature_name: String,
    pub extracted_present: bool,
    pub ground_truth_present: bool,
    pub score: f64,
    pub match_type: String,
}

/// Scored outcome for one (domain, crawler, llm) combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub domain: String,
    pub crawler: String,
    pub llm: String,
    pub overall_accuracy: f64,
    pub features_found: usize,
    pub features_correct: usize,
    #[serde(default)]
    pub overall_presence_accuracy: f64,
    #[serde(default)]
    pub features_present_correct: usize,
    #[serde(default)]
    pub homepage_internal_links: usize,
    #[serde(default)]
    pub homepage_internal_links_crawled: usize,
    #[serde(default)]
    pub homepage_total_links: usize,
    #[serde(default)]
    pub homepage_external_links: usize,
    #[serde(default)]
    pub feature_scores: Vec<FeatureScore>,
    #[serde(default)]
    pub presence_scores: Vec<PresenceScore>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl EvaluationResult {
    /// Zero-accuracy result carrying a single error
    pub fn failed(domain: &str, crawler: &str, llm: &str, error: impl Into<String>) -> Self {
        Self {
            domain: domain.to_string(),
            crawler: crawler.to_string(),
            llm: llm.to_string(),
            overall_accuracy: 0.0,
            features_found: 0,
            features_correct: 0,
            overall_presence_accuracy: 0.0,
            features_present_correct: 0,
            homepage_internal_links: 0,
            homepage_internal_links_crawled: 0,
            homepage_total_links: 0,
            homepage_external_links: 0,
            feature_scores: Vec::new(),
            presence_scores: Vec::new(),
            errors: vec![error.into()],
        }
    }

    /// Copies the crawl-time link counters into this evaluation
    pub fn annotate_links(&mut self, crawl: &CrawlResult) {
        self.homepage_internal_links = crawl.homepage_internal_links;
        self.homepage_internal_links_crawled = crawl.homepage_internal_links_crawled;
        self.homepage_total_links = crawl.homepage_total_links;
        self.homepage_external_links = crawl.homepage_external_links;
    }

    /// Key used for the per-combination summaries, e.g. `jina+openai`
    pub fn combo_key(&self) -> String {
        format!("{}+{}", self.crawler, self.llm)
    }
}

/// One feature's similarity as judged by a comparison model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSimilarity {
    pub feature: String,
    pub similarity: f64,
    #[serde(default)]
    pub rationale: String,
}

/// Secondary comparison scores stored beside an artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRecord {
    pub domain: String,
    pub crawler: String,
    pub llm: String,
    pub openai: Vec<FeatureSimilarity>,
}

/// Mean score per group key
pub type SummaryMap = BTreeMap<String, f64>;

/// Aggregate outcome of a benchmark run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub timestamp: DateTime<Utc>,
    pub total_domains: usize,
    pub total_combinations: usize,
    pub results: Vec<EvaluationResult>,
    pub summary_by_crawler: SummaryMap,
    pub summary_by_llm: SummaryMap,
    pub summary_by_combo: SummaryMap,
    pub summary_by_crawler_presence: SummaryMap,
    pub summary_by_llm_presence: SummaryMap,
    pub summary_by_combo_presence: SummaryMap,
    #[serde(default)]
    pub config_hash: Option<String>,
}
