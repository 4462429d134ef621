//! Scrape-Bench: a crawl-and-cache benchmark harness
//!
//! This crate turns company domains into crawled page content through a set of
//! interchangeable crawler backends, feeds the content to LLM extractors, scores
//! the extracted features against ground truth, and caches every intermediate
//! artifact so a re-run never repeats a paid call.

pub mod backends;
pub mod config;
pub mod crawler;
pub mod extractor;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod scorer;
pub mod state;
pub mod storage;
pub mod types;
pub mod url;

use thiserror::Error;

/// Main error type for Scrape-Bench operations
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("{name} requires {variable} to be set")]
    MissingCredential { name: String, variable: String },

    #[error("Unknown {kind}: {name}")]
    UnknownComponent { kind: &'static str, name: String },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Invalid stage transition: {from} -> {to}")]
    InvalidTransition {
        from: state::Stage,
        to: state::Stage,
    },

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Ground truth error: {0}")]
    GroundTruth(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Missing API keys: {}", .0.join(", "))]
    MissingApiKeys(Vec<String>),

    #[error("Invalid environment value for {name}: {value}")]
    InvalidEnv { name: String, value: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Scrape-Bench operations
pub type Result<T> = std::result::Result<T, BenchError>;

// Re-export commonly used types
pub use config::Config;
pub use pipeline::{BenchmarkPipeline, RunOptions};
pub use state::Stage;
pub use types::{BenchmarkReport, CrawlResult, EvaluationResult, ExtractedFeatures, ParsedContent};
