//! Scoring extracted features against ground truth
//!
//! The default [`GroundTruthScorer`] reads a JSONL file of verified company
//! records and compares each feature with type-specific rules.

mod ground_truth;

pub use ground_truth::{is_present_value, GroundTruthScorer};

use crate::types::{EvaluationResult, ExtractedFeatures};
use serde_json::Value;
use std::collections::BTreeMap;

/// Something that can grade an extraction
pub trait Scorer: Send + Sync {
    /// Scores every feature of `extraction`
    ///
    /// A domain without ground truth gets a zero result with one error.
    fn evaluate(&self, extraction: &ExtractedFeatures) -> EvaluationResult;

    /// Normalized ground-truth value per feature, or `None` if the domain is unknown
    ///
    /// Absent features map to `null`.
    fn ground_truth_values(&self, domain: &str) -> Option<BTreeMap<String, Value>>;
}
