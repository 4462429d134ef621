//! Configuration module for Scrape-Bench
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and overlays API keys and a few settings from the environment.
//!
//! # Example
//!
//! ```no_run
//! use scrape_bench::config::resolve_config;
//! use std::path::Path;
//!
//! let (config, _hash) = resolve_config(Some(Path::new("bench.toml"))).unwrap();
//! println!("Crawling at most {} pages per domain", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ApiKeys, Config, CrawlerConfig, EndpointConfig, ModelConfig, OutputConfig};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_config_with_hash, load_env_file,
    mask_key, resolve_config, API_KEY_VARS,
};

pub use validation::{crawler_key, extractor_key, validate, validate_api_keys};
