use crate::extractor::prompt::{build_user_message, JsonRecovery, SYSTEM_MESSAGE};
use crate::extractor::schema::feature_names;
use crate::extractor::Extractor;
use crate::types::{ExtractedFeatures, ParsedContent};
use crate::BenchError;
use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;

/// How long a single model call may take
pub const LLM_TIMEOUT: Duration = Duration::from_secs(300);

/// A chat-style model endpoint
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Sends one system + user exchange and returns the raw reply text
    async fn complete(&self, system: &str, user: &str) -> Result<String, BenchError>;
}

/// Builds the HTTP client shared by the model adapters
pub fn llm_http_client() -> Result<reqwest::Client, BenchError> {
    Ok(reqwest::Client::builder().timeout(LLM_TIMEOUT).build()?)
}

/// Turns parsed content into features through a chat model
///
/// Call and parse failures are folded into the result: the features come
/// back all null and `error` explains why.
pub struct ModelExtractor {
    name: String,
    model: Box<dyn ChatModel>,
    recovery: JsonRecovery,
}

impl ModelExtractor {
    pub fn new(name: &str, model: Box<dyn ChatModel>) -> Result<Self, BenchError> {
        Ok(Self {
            name: name.to_string(),
            model,
            recovery: JsonRecovery::new()?,
        })
    }

    async fn call(&self, parsed: &ParsedContent) -> Result<ExtractedFeatures, BenchError> {
        let user = build_user_message(&parsed.markdown);
        let raw = self.model.complete(SYSTEM_MESSAGE, &user).await?;
        let features = self.recovery.features(&raw)?;

        Ok(ExtractedFeatures {
            domain: parsed.domain.clone(),
            crawler: parsed.crawler.clone(),
            llm: self.name.clone(),
            extracted_at: Utc::now(),
            features,
            raw_llm_response: raw,
            error: None,
        })
    }
}

#[async_trait]
impl Extractor for ModelExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn extract(&self, parsed: &ParsedContent) -> Result<ExtractedFeatures, BenchError> {
        match self.call(parsed).await {
            Ok(features) => {
                tracing::info!(
                    domain = %parsed.domain,
                    crawler = %parsed.crawler,
                    extractor = %self.name,
                    "extraction finished"
                );
                Ok(features)
            }
            Err(e) => {
                tracing::warn!(
                    domain = %parsed.domain,
                    crawler = %parsed.crawler,
                    extractor = %self.name,
                    "extraction failed: {}",
                    e
                );
                Ok(ExtractedFeatures::failed(
                    parsed,
                    &self.name,
                    feature_names(),
                    e.to_string(),
                ))
            }
        }
    }
}
