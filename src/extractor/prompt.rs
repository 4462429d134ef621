use crate::extractor::schema::{feature_names, SCHEMA};
use crate::BenchError;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// System message sent with every extraction request
pub const SYSTEM_MESSAGE: &str = "You are an expert data extraction AI. \
    Extract structured company information from website content. \
    Return ONLY valid JSON matching the AugmentedCompany schema.";

/// Builds the extraction instructions from the schema
///
/// The website content is appended after the final line.
pub fn build_extraction_prompt() -> String {
    let mut lines: Vec<String> = vec![
        "You are a precise data extraction system. Analyze the following website content \
         and extract structured information about this company."
            .to_string(),
        String::new(),
        "Return a JSON object conforming to the schema below. For each field that has a \
         corresponding _explanation field, fill the explanation FIRST (provide multiple \
         detailed reasons), then give your final answer in the decision field."
            .to_string(),
        String::new(),
        "IMPORTANT RULES:".to_string(),
        "1. Only extract information that is EXPLICITLY stated in the content. Do not guess or infer."
            .to_string(),
        "2. For Literal fields, return ONLY one of the allowed values shown.".to_string(),
        "3. For list fields, return an empty list [] if no information is found.".to_string(),
        "4. For string fields, return 'unknown' if the information is not available.".to_string(),
        "5. Fill explanation fields with detailed reasoning BEFORE the corresponding decision field."
            .to_string(),
        "6. Return ONLY valid JSON, no markdown formatting, no extra text.".to_string(),
        String::new(),
        "── SCHEMA ──".to_string(),
        String::new(),
    ];

    for field in SCHEMA {
        lines.push(format!(
            "- {} ({}): {}",
            field.name,
            field.prompt_type(),
            field.description
        ));
    }

    lines.push(String::new());
    lines.push("── END SCHEMA ──".to_string());
    lines.push(String::new());
    lines.push("Website content to analyze:".to_string());

    lines.join("\n")
}

/// User message for one document: instructions, blank line, content
pub fn build_user_message(markdown: &str) -> String {
    format!("{}\n\n{}", build_extraction_prompt(), markdown)
}

/// Pulls a JSON object out of free-form model output
#[derive(Debug, Clone)]
pub struct JsonRecovery {
    fenced: Regex,
    braces: Regex,
}

impl JsonRecovery {
    pub fn new() -> Result<Self, BenchError> {
        Ok(Self {
            fenced: Regex::new(r"(?s)```(?:json)?\s*\n?(.*?)\n?```")?,
            braces: Regex::new(r"(?s)\{.*\}")?,
        })
    }

    /// Parses model output as a JSON object
    ///
    /// # Recovery Order
    ///
    /// 1. The whole text
    /// 2. The first fenced code block
    /// 3. The span from the first `{` to the last `}`
    pub fn parse(&self, text: &str) -> Result<Map<String, Value>, BenchError> {
        if let Ok(value) = serde_json::from_str::<Value>(text) {
            return as_object(value);
        }

        if let Some(block) = self.fenced.captures(text).and_then(|caps| caps.get(1)) {
            return as_object(serde_json::from_str(block.as_str())?);
        }

        if let Some(span) = self.braces.find(text) {
            return as_object(serde_json::from_str(span.as_str())?);
        }

        let excerpt: String = text.chars().take(200).collect();
        Err(BenchError::Extraction(format!(
            "Could not parse JSON from LLM response: {}",
            excerpt
        )))
    }

    /// Parses model output and keeps only the scored features
    ///
    /// Features the model left out are recorded as null.
    pub fn features(&self, text: &str) -> Result<BTreeMap<String, Value>, BenchError> {
        let object = self.parse(text)?;
        Ok(feature_names()
            .into_iter()
            .map(|name| {
                let value = object.get(name).cloned().unwrap_or(Value::Null);
                (name.to_string(), value)
            })
            .collect())
    }
}

fn as_object(value: Value) -> Result<Map<String, Value>, BenchError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(BenchError::Extraction(format!(
            "Expected a JSON object from LLM, got: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recovery() -> JsonRecovery {
        JsonRecovery::new().unwrap()
    }

    #[test]
    fn test_prompt_lists_every_field() {
        let prompt = build_extraction_prompt();
        assert!(prompt.starts_with("You are a precise data extraction system."));
        assert!(prompt.contains("\n── SCHEMA ──\n\n- domain (str): The company's domain name\n"));
        assert!(prompt.contains(
            "- product_category (one of [\"non-profit\", \"B2B\", \"B2C\", \"SMB\", \"unknown\"]): "
        ));
        assert!(prompt.contains("- competitors (list[str]): "));
        assert!(prompt.ends_with("── END SCHEMA ──\n\nWebsite content to analyze:"));
    }

    #[test]
    fn test_user_message_appends_content() {
        let message = build_user_message("# PAGE: HOMEPAGE\n\nhi");
        assert!(message.ends_with("Website content to analyze:\n\n# PAGE: HOMEPAGE\n\nhi"));
    }

    #[test]
    fn test_parse_plain_json() {
        let map = recovery().parse(r#"{"language": "en"}"#).unwrap();
        assert_eq!(map["language"], "en");
    }

    #[test]
    fn test_parse_fenced_json() {
        let text = "Here you go:\n```json\n{\"patents\": \"3\"}\n```\nDone.";
        assert_eq!(recovery().parse(text).unwrap()["patents"], "3");
    }

    #[test]
    fn test_parse_embedded_braces() {
        let text = "Result: {\"used_by\": [\"Acme\"]} (end)";
        assert_eq!(recovery().parse(text).unwrap()["used_by"][0], "Acme");
    }

    #[test]
    fn test_parse_failure_quotes_response() {
        let err = recovery().parse("no json here").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Extraction failed: Could not parse JSON from LLM response: no json here"
        );
    }

    #[test]
    fn test_features_keep_only_schema_features() {
        let text = r#"{"domain": "x.com", "language": "en", "language_explanation": [], "extra": 1}"#;
        let features = recovery().features(text).unwrap();
        assert_eq!(features.len(), 20);
        assert_eq!(features["language"], "en");
        assert!(features["patents"].is_null());
        assert!(!features.contains_key("domain"));
        assert!(!features.contains_key("extra"));
    }
}
