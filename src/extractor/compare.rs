//! Secondary, model-judged similarity scores
//!
//! The rule-based scorer is strict about wording; a comparison model gives
//! partial credit for paraphrases. Its scores replace the rule-based ones
//! only when `--llm-compare` is requested.

use crate::extractor::clients::OpenAiChat;
use crate::extractor::model::ChatModel;
use crate::extractor::prompt::JsonRecovery;
use crate::types::{EvaluationResult, FeatureSimilarity};
use crate::BenchError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

/// Score at or above which a feature counts as correct
pub const CORRECT_THRESHOLD: f64 = 0.8;

const COMPARE_MAX_TOKENS: u32 = 4000;

const COMPARE_SYSTEM_MESSAGE: &str =
    "You are a precise evaluator. Return only valid JSON that matches the schema.";

/// Judges how close extracted values are to ground truth
#[async_trait]
pub trait ValueComparator: Send + Sync {
    async fn compare(
        &self,
        extracted: &BTreeMap<String, Value>,
        ground_truth: &BTreeMap<String, Value>,
    ) -> Result<Vec<FeatureSimilarity>, BenchError>;
}

/// Builds the comparison request for one extraction
pub fn build_compare_prompt(
    extracted: &BTreeMap<String, Value>,
    ground_truth: &BTreeMap<String, Value>,
) -> Result<String, BenchError> {
    Ok(format!(
        "Compare extracted feature values to ground truth values. \
         For each feature, output a similarity score between 0.0 and 1.0 and a short rationale. \
         Use partial credit for overlapping items and fuzzy matches. \
         If both are empty/unknown, similarity should be 1.0. \
         If ground truth is present but extracted is empty/unknown, similarity should be 0.0.\n\n\
         Respond with a JSON object of the form \
         {{\"results\": [{{\"feature\": str, \"similarity\": float, \"rationale\": str}}]}}.\n\n\
         EXTRACTED:\n{}\n\nGROUND_TRUTH:\n{}\n",
        serde_json::to_string(extracted)?,
        serde_json::to_string(ground_truth)?,
    ))
}

/// Comparator backed by an OpenAI chat model
pub struct OpenAiComparator {
    model: Box<dyn ChatModel>,
    recovery: JsonRecovery,
}

impl OpenAiComparator {
    pub fn new(api_key: &str, endpoint: &str, model: &str) -> Result<Self, BenchError> {
        let chat = OpenAiChat::new(api_key, endpoint, model)?.with_max_tokens(COMPARE_MAX_TOKENS);
        Self::with_model(Box::new(chat))
    }

    /// Wraps any chat model
    pub fn with_model(model: Box<dyn ChatModel>) -> Result<Self, BenchError> {
        Ok(Self {
            model,
            recovery: JsonRecovery::new()?,
        })
    }
}

#[async_trait]
impl ValueComparator for OpenAiComparator {
    async fn compare(
        &self,
        extracted: &BTreeMap<String, Value>,
        ground_truth: &BTreeMap<String, Value>,
    ) -> Result<Vec<FeatureSimilarity>, BenchError> {
        let prompt = build_compare_prompt(extracted, ground_truth)?;
        let raw = self.model.complete(COMPARE_SYSTEM_MESSAGE, &prompt).await?;
        let mut object = self.recovery.parse(&raw)?;

        match object.remove("results") {
            Some(results) => Ok(serde_json::from_value(results)?),
            None => Ok(Vec::new()),
        }
    }
}

/// Overwrites rule-based feature scores with model similarities
///
/// Overall accuracy becomes the mean feature score, and a feature counts as
/// correct at [`CORRECT_THRESHOLD`]. Features the comparison did not mention
/// keep their rule-based score; an empty comparison changes nothing.
pub fn apply_comparison(result: &mut EvaluationResult, similarities: &[FeatureSimilarity]) {
    let by_feature: BTreeMap<&str, f64> = similarities
        .iter()
        .map(|s| (s.feature.as_str(), s.similarity))
        .collect();
    if by_feature.is_empty() {
        return;
    }

    for score in &mut result.feature_scores {
        if let Some(similarity) = by_feature.get(score.feature_name.as_str()) {
            score.score = *similarity;
            score.match_type = "llm_similarity".to_string();
        }
    }

    if !result.feature_scores.is_empty() {
        let total: f64 = result.feature_scores.iter().map(|s| s.score).sum();
        result.overall_accuracy = total / result.feature_scores.len() as f64;
        result.features_correct = result
            .feature_scores
            .iter()
            .filter(|s| s.score >= CORRECT_THRESHOLD)
            .count();
    }
}
