use crate::extractor::schema::{feature_names, feature_type, FeatureType, GT_FIELD_MAP, GT_INVERTED_BOOLEANS};
use crate::extractor::CORRECT_THRESHOLD;
use crate::scorer::Scorer;
use crate::types::{EvaluationResult, ExtractedFeatures, FeatureScore, PresenceScore};
use crate::url::lookup_key;
use crate::BenchError;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// Every ground-truth record starts with this key
const RECORD_START: &str = "{\"company\"";

/// One ground-truth feature after lookup and normalization
struct TruthFeature {
    present: bool,
    value: Value,
}

/// Scores extractions against a JSONL ground-truth file
///
/// Records may span several lines; the file is split wherever a new
/// `{"company"` object begins. Records that fail to parse are skipped.
pub struct GroundTruthScorer {
    index: HashMap<String, Value>,
    words: Regex,
}

impl GroundTruthScorer {
    /// Loads ground truth from a file
    pub fn from_path(path: &Path) -> Result<Self, BenchError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BenchError::GroundTruth(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_jsonl(&content)
    }

    /// Builds the index from JSONL text
    pub fn from_jsonl(content: &str) -> Result<Self, BenchError> {
        let mut index = HashMap::new();
        for chunk in split_records(content) {
            let chunk = chunk.trim();
            if chunk.is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(chunk) {
                Ok(record) => {
                    let url = record.get("url").and_then(Value::as_str).unwrap_or_default();
                    index.insert(lookup_key(url), record);
                }
                Err(e) => tracing::debug!("Skipping unparseable ground-truth record: {}", e),
            }
        }

        tracing::info!(records = index.len(), "Loaded ground truth");
        Ok(Self {
            index,
            words: Regex::new(r"\w+")?,
        })
    }

    /// Number of indexed records
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn record(&self, domain: &str) -> Option<&Value> {
        self.index.get(&lookup_key(domain))
    }

    fn truth_for(&self, record: &Value, name: &str) -> TruthFeature {
        let found = record
            .get("features")
            .and_then(Value::as_object)
            .and_then(|features| lookup_feature(features, name));
        let Some((raw, used_legacy_name)) = found else {
            return TruthFeature {
                present: false,
                value: Value::Null,
            };
        };

        let present = raw.get("present").is_some_and(truthy);
        let value = if present {
            normalize_truth_value(name, raw, used_legacy_name)
        } else {
            Value::Null
        };
        TruthFeature { present, value }
    }

    fn word_set(&self, text: &str) -> HashSet<String> {
        self.words
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Word overlap relative to the larger set, or `None` if either side has no words
    fn word_overlap(&self, a: &HashSet<String>, b: &HashSet<String>) -> Option<f64> {
        if a.is_empty() || b.is_empty() {
            return None;
        }
        let shared = a.intersection(b).count();
        Some(shared as f64 / a.len().max(b.len()) as f64)
    }

    fn score_feature(&self, name: &str, extracted: &Value, truth: &TruthFeature) -> (f64, &'static str) {
        match (extracted.is_null(), truth.present) {
            (true, false) => return (1.0, "both_null"),
            (true, true) => return (0.0, "missing"),
            (false, false) => {
                let empty = match extracted {
                    Value::Array(items) => items.is_empty(),
                    Value::String(s) => s.is_empty() || s.to_lowercase() == "unknown",
                    _ => false,
                };
                return if empty {
                    (1.0, "both_null")
                } else {
                    (0.3, "false_positive")
                };
            }
            (false, true) => {}
        }

        match feature_type(name).unwrap_or(FeatureType::Text) {
            FeatureType::LiteralBool => score_bool(extracted, &truth.value),
            FeatureType::LiteralEnum => score_enum(extracted, &truth.value),
            FeatureType::List => self.score_list(extracted, &truth.value),
            FeatureType::Text => self.score_text(extracted, &truth.value),
        }
    }

    /// Jaccard similarity on lowercased items, with a word-overlap fallback
    fn score_list(&self, extracted: &Value, truth: &Value) -> (f64, &'static str) {
        let ours = normalize_list(extracted);
        let theirs = normalize_list(truth);

        if ours.is_empty() && theirs.is_empty() {
            return (1.0, "both_null");
        }
        if ours.is_empty() || theirs.is_empty() {
            return (0.2, "mismatch");
        }

        let ours_set: HashSet<&str> = ours.iter().map(String::as_str).collect();
        let theirs_set: HashSet<&str> = theirs.iter().map(String::as_str).collect();
        let shared = ours_set.intersection(&theirs_set).count();
        let union = ours_set.union(&theirs_set).count();

        let jaccard = shared as f64 / union as f64;
        if jaccard >= 0.8 {
            return (1.0, "exact");
        }
        if jaccard >= 0.5 {
            return (0.8, "close");
        }

        let our_words = self.word_set(&ours.join(" "));
        let their_words = self.word_set(&theirs.join(" "));
        match self.word_overlap(&our_words, &their_words) {
            Some(overlap) if overlap > 0.5 => (0.6, "partial"),
            _ => (0.2, "mismatch"),
        }
    }

    fn score_text(&self, extracted: &Value, truth: &Value) -> (f64, &'static str) {
        let ours = lowered(extracted);
        let theirs = lowered(truth);

        if ours == theirs {
            return (1.0, "exact");
        }
        if ours.contains(&theirs) || theirs.contains(&ours) {
            return (0.8, "substring");
        }
        match self.word_overlap(&self.word_set(&ours), &self.word_set(&theirs)) {
            Some(overlap) if overlap > 0.5 => (0.6, "partial"),
            _ => (0.2, "mismatch"),
        }
    }
}

impl Scorer for GroundTruthScorer {
    fn evaluate(&self, extraction: &ExtractedFeatures) -> EvaluationResult {
        let Some(record) = self.record(&extraction.domain) else {
            return EvaluationResult::failed(
                &extraction.domain,
                &extraction.crawler,
                &extraction.llm,
                format!("No ground truth found for {}", extraction.domain),
            );
        };

        let names = feature_names();
        let mut result = EvaluationResult::failed(&extraction.domain, &extraction.crawler, &extraction.llm, "");
        result.errors.clear();

        for name in &names {
            let extracted = extraction.features.get(*name).cloned().unwrap_or(Value::Null);
            let expected = self.truth_for(record, name);

            let extracted_present = is_present_value(&extracted);
            if extracted_present {
                result.features_found += 1;
            }

            let (score, match_type) = self.score_feature(name, &extracted, &expected);
            if score >= CORRECT_THRESHOLD {
                result.features_correct += 1;
            }

            let presence_matches = extracted_present == expected.present;
            if presence_matches {
                result.features_present_correct += 1;
            }

            result.presence_scores.push(PresenceScore {
                feature_name: name.to_string(),
                extracted_present,
                ground_truth_present: expected.present,
                score: if presence_matches { 1.0 } else { 0.0 },
                match_type: if presence_matches { "exact" } else { "mismatch" }.to_string(),
            });
            result.feature_scores.push(FeatureScore {
                feature_name: name.to_string(),
                extracted_value: extracted,
                ground_truth_value: expected.value,
                score,
                match_type: match_type.to_string(),
            });
        }

        if !names.is_empty() {
            result.overall_accuracy = result.features_correct as f64 / names.len() as f64;
            result.overall_presence_accuracy = result.features_present_correct as f64 / names.len() as f64;
        }
        result
    }

    fn ground_truth_values(&self, domain: &str) -> Option<BTreeMap<String, Value>> {
        let record = self.record(domain)?;
        Some(
            feature_names()
                .into_iter()
                .map(|name| (name.to_string(), self.truth_for(record, name).value))
                .collect(),
        )
    }
}

/// True if an extracted value carries information
///
/// Null, blank strings, `unknown`/`null`/`none` and lists of blank items are
/// all treated as absent.
pub fn is_present_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Array(items) => items.iter().any(|item| !display(item).trim().is_empty()),
        Value::String(s) => !matches!(s.trim().to_lowercase().as_str(), "" | "unknown" | "null" | "none"),
        _ => true,
    }
}

/// Splits the file wherever a new record begins
fn split_records(content: &str) -> Vec<&str> {
    let mut starts: Vec<usize> = content.match_indices(RECORD_START).map(|(i, _)| i).collect();
    if starts.first() != Some(&0) {
        starts.insert(0, 0);
    }

    starts
        .iter()
        .enumerate()
        .map(|(n, &start)| {
            let end = starts.get(n + 1).copied().unwrap_or(content.len());
            &content[start..end]
        })
        .collect()
}

/// Finds a feature under its legacy names first, then its current name
///
/// Returns the raw record and whether a legacy name matched.
fn lookup_feature<'a>(features: &'a Map<String, Value>, name: &str) -> Option<(&'a Value, bool)> {
    for (legacy, _) in GT_FIELD_MAP.iter().filter(|(_, current)| *current == name) {
        let candidates = [legacy.to_string(), legacy.replace('_', " "), legacy.replace(' ', "_")];
        if let Some(raw) = candidates.iter().find_map(|key| features.get(key)) {
            return Some((raw, true));
        }
    }
    features.get(name).map(|raw| (raw, false))
}

/// Brings a ground-truth value into the shape extractors produce
///
/// | Type | Normalization |
/// |------|---------------|
/// | bool | `yes…`/`true…`/`1` → `"true"`, `no…`/`false…`/`0` → `"false"`, else `"true"`; legacy inverted fields flip |
/// | enum | lowercased, trimmed |
/// | list, text | unchanged |
fn normalize_truth_value(name: &str, raw: &Value, used_legacy_name: bool) -> Value {
    let value = raw.get("value").cloned().unwrap_or_else(|| Value::String(String::new()));

    match feature_type(name).unwrap_or(FeatureType::Text) {
        FeatureType::LiteralBool => {
            let low = lowered(&value);
            let affirmative = low.starts_with("yes") || low.starts_with("true") || low == "1";
            let negative = low.starts_with("no") || low.starts_with("false") || low == "0";
            let mut truth = affirmative || !negative;
            if used_legacy_name && GT_INVERTED_BOOLEANS.contains(&name) {
                truth = !truth;
            }
            Value::String(truth.to_string())
        }
        FeatureType::LiteralEnum => Value::String(lowered(&value)),
        FeatureType::List | FeatureType::Text => value,
    }
}

fn score_bool(extracted: &Value, truth: &Value) -> (f64, &'static str) {
    let ours = lowered(extracted);
    let theirs = match lowered(truth).as_str() {
        "yes" | "1" => "true".to_string(),
        "no" | "0" => "false".to_string(),
        other => other.to_string(),
    };

    if ours == theirs {
        (1.0, "exact")
    } else if ours == "unknown" || theirs == "unknown" {
        (0.5, "partial")
    } else {
        (0.0, "mismatch")
    }
}

fn score_enum(extracted: &Value, truth: &Value) -> (f64, &'static str) {
    let ours = lowered(extracted);
    let theirs = lowered(truth);

    if ours == theirs {
        (1.0, "exact")
    } else if ours.contains(&theirs) || theirs.contains(&ours) {
        (0.6, "partial")
    } else {
        (0.0, "mismatch")
    }
}

/// Lowercased list items; strings are split on commas
fn normalize_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter(|item| truthy(item))
            .map(|item| display(item).to_lowercase().trim().to_string())
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(|item| item.trim().to_lowercase())
            .filter(|item| !item.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// Strings as-is, everything else as compact JSON
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn lowered(value: &Value) -> String {
    display(value).to_lowercase().trim().to_string()
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
