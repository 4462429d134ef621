//! Chat-model adapters for the OpenAI and Anthropic HTTP APIs

use crate::crawler::send_for_json;
use crate::extractor::model::{llm_http_client, ChatModel};
use crate::extractor::schema::json_schema;
use crate::BenchError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Upper bound on generated tokens per extraction
pub const EXTRACTION_MAX_TOKENS: u32 = 8000;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const EXTRACTION_TOOL: &str = "extract_company_data";

fn llm_error(provider: &str, error: impl std::fmt::Display) -> BenchError {
    BenchError::Extraction(format!("{} request failed: {}", provider, error))
}

/// OpenAI chat completions with a JSON-object response format
pub struct OpenAiChat {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiChat {
    pub fn new(api_key: &str, endpoint: &str, model: &str) -> Result<Self, BenchError> {
        Ok(Self {
            client: llm_http_client()?,
            api_key: api_key.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            max_tokens: EXTRACTION_MAX_TOKENS,
        })
    }

    /// Overrides the generation limit
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, system: &str, user: &str) -> Result<String, BenchError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "temperature": 0,
            "max_tokens": self.max_tokens,
            "response_format": {"type": "json_object"},
        });

        let request = self.client.post(&url).bearer_auth(&self.api_key).json(&body);
        let response = send_for_json(&url, request)
            .await
            .map_err(|e| llm_error("OpenAI", e))?;

        Ok(response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .unwrap_or("{}")
            .to_string())
    }
}

/// Anthropic messages API with a forced extraction tool call
///
/// The tool's input schema is the feature schema, so the reply's `tool_use`
/// block already holds the feature object.
pub struct AnthropicChat {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl AnthropicChat {
    pub fn new(api_key: &str, endpoint: &str, model: &str) -> Result<Self, BenchError> {
        Ok(Self {
            client: llm_http_client()?,
            api_key: api_key.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

/// Picks the tool input, else the first text block, else `{}`
fn anthropic_reply(response: &Value) -> Result<String, BenchError> {
    let blocks = response
        .get("content")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    if let Some(input) = blocks
        .iter()
        .find(|b| b["type"] == "tool_use")
        .and_then(|b| b.get("input"))
    {
        return Ok(serde_json::to_string(input)?);
    }

    Ok(blocks
        .iter()
        .find(|b| b["type"] == "text")
        .and_then(|b| b["text"].as_str())
        .unwrap_or("{}")
        .to_string())
}

#[async_trait]
impl ChatModel for AnthropicChat {
    async fn complete(&self, system: &str, user: &str) -> Result<String, BenchError> {
        let url = format!("{}/messages", self.endpoint);
        let body = json!({
            "model": self.model,
            "max_tokens": EXTRACTION_MAX_TOKENS,
            "temperature": 0,
            "system": system,
            "tools": [{
                "name": EXTRACTION_TOOL,
                "description": "Extract structured company data from website content.",
                "input_schema": json_schema(),
            }],
            "tool_choice": {"type": "tool", "name": EXTRACTION_TOOL},
            "messages": [{"role": "user", "content": user}],
        });

        let request = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);
        let response = send_for_json(&url, request)
            .await
            .map_err(|e| llm_error("Anthropic", e))?;

        anthropic_reply(&response)
    }
}
