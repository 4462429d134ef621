//! LLM feature extraction
//!
//! Extractors read a [`ParsedContent`] document and return the fixed feature
//! set described by [`schema`]. Three are built in:
//! - `openai` (chat completions, JSON object mode)
//! - `claude` and `haiku` (Anthropic messages with a forced tool call)

mod clients;
mod compare;
mod model;
mod prompt;
pub mod schema;

pub use clients::{AnthropicChat, OpenAiChat, EXTRACTION_MAX_TOKENS};
pub use compare::{apply_comparison, build_compare_prompt, OpenAiComparator, ValueComparator, CORRECT_THRESHOLD};
pub use model::{llm_http_client, ChatModel, ModelExtractor, LLM_TIMEOUT};
pub use prompt::{build_extraction_prompt, build_user_message, JsonRecovery, SYSTEM_MESSAGE};
pub use schema::{feature_names, FeatureType};

use crate::config::Config;
use crate::types::{ExtractedFeatures, ParsedContent};
use crate::BenchError;
use async_trait::async_trait;
use indexmap::IndexMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Something that turns a parsed document into features
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Identifier recorded on every result, e.g. `openai`
    fn name(&self) -> &str;

    async fn extract(&self, parsed: &ParsedContent) -> Result<ExtractedFeatures, BenchError>;
}

/// The built-in extractors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractorKind {
    OpenAi,
    Claude,
    Haiku,
}

impl ExtractorKind {
    pub const ALL: [ExtractorKind; 3] = [ExtractorKind::OpenAi, ExtractorKind::Claude, ExtractorKind::Haiku];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Claude => "claude",
            Self::Haiku => "haiku",
        }
    }

    /// Constructs the extractor with the configured model and endpoint
    pub fn create(&self, config: &Config) -> Result<Arc<dyn Extractor>, BenchError> {
        let (provider, variable) = match self {
            Self::OpenAi => ("openai", "OPENAI_API_KEY"),
            Self::Claude | Self::Haiku => ("anthropic", "ANTHROPIC_API_KEY"),
        };
        let api_key = config
            .api_keys
            .get(provider)
            .ok_or_else(|| BenchError::MissingCredential {
                name: self.as_str().to_string(),
                variable: variable.to_string(),
            })?;

        let chat: Box<dyn ChatModel> = match self {
            Self::OpenAi => Box::new(OpenAiChat::new(
                api_key,
                &config.endpoints.openai,
                &config.models.openai,
            )?),
            Self::Claude => Box::new(AnthropicChat::new(
                api_key,
                &config.endpoints.anthropic,
                &config.models.claude,
            )?),
            Self::Haiku => Box::new(AnthropicChat::new(
                api_key,
                &config.endpoints.anthropic,
                &config.models.haiku,
            )?),
        };

        Ok(Arc::new(ModelExtractor::new(self.as_str(), chat)?))
    }
}

impl fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractorKind {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| BenchError::UnknownComponent {
                kind: "extractor",
                name: s.to_string(),
            })
    }
}

/// Builds an extractor from the run configuration
pub type ExtractorFactory = Arc<dyn Fn(&Config) -> Result<Arc<dyn Extractor>, BenchError> + Send + Sync>;

/// Maps extractor names to constructors
pub struct ExtractorRegistry {
    factories: IndexMap<String, ExtractorFactory>,
}

impl ExtractorRegistry {
    /// A registry with no extractors
    pub fn empty() -> Self {
        Self {
            factories: IndexMap::new(),
        }
    }

    /// Registers (or replaces) an extractor under `name`
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&Config) -> Result<Arc<dyn Extractor>, BenchError> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Arc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Constructs the extractor registered under `name`
    pub fn create(&self, name: &str, config: &Config) -> Result<Arc<dyn Extractor>, BenchError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| BenchError::UnknownComponent {
                kind: "extractor",
                name: name.to_string(),
            })?;
        factory(config)
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for kind in ExtractorKind::ALL {
            registry.register(kind.as_str(), move |config| kind.create(config));
        }
        registry
    }
}
