use crate::config::types::{ApiKeys, Config, CrawlerConfig, EndpointConfig, OutputConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_endpoints(&config.endpoints)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.max_retries < 1 || config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be between 1 and 10, got {}",
            config.max_retries
        )));
    }

    if config.max_pages > 100 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be <= 100, got {}",
            config.max_pages
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates that every endpoint is an absolute http(s) URL
fn validate_endpoints(config: &EndpointConfig) -> Result<(), ConfigError> {
    for (name, endpoint) in config.entries() {
        let url = Url::parse(endpoint)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} endpoint: {}", name, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "{} endpoint must use http or https, got '{}'",
                name, endpoint
            )));
        }
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.output_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output-dir cannot be empty".to_string(),
        ));
    }

    if config.ground_truth_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "ground-truth-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Environment variable and provider behind a crawler's credential
pub fn crawler_key(crawler: &str) -> Option<(&'static str, &'static str)> {
    match crawler {
        "firecrawl" => Some(("FIRECRAWL_API_KEY", "firecrawl")),
        "jina" => Some(("JINA_API_KEY", "jina")),
        "scrapingbee" => Some(("SCRAPINGBEE_API_KEY", "scrapingbee")),
        "scraperapi" => Some(("SCRAPERAPI_API_KEY", "scraperapi")),
        _ => None,
    }
}

/// Environment variable and provider behind an extractor's credential
pub fn extractor_key(llm: &str) -> Option<(&'static str, &'static str)> {
    match llm {
        "openai" => Some(("OPENAI_API_KEY", "openai")),
        "claude" | "haiku" => Some(("ANTHROPIC_API_KEY", "anthropic")),
        _ => None,
    }
}

/// Checks that every selected crawler and extractor has its API key
///
/// Local crawlers need no key. All problems are reported together.
pub fn validate_api_keys(
    keys: &ApiKeys,
    crawlers: &[String],
    extractors: &[String],
) -> Result<(), ConfigError> {
    let mut missing = Vec::new();

    for crawler in crawlers {
        if let Some((variable, provider)) = crawler_key(crawler) {
            if keys.get(provider).is_none() {
                missing.push(format!("{} required for {} crawler", variable, crawler));
            }
        }
    }

    for llm in extractors {
        if let Some((variable, provider)) = extractor_key(llm) {
            if keys.get(provider).is_none() {
                missing.push(format!("{} required for {} LLM", variable, llm));
            }
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::MissingApiKeys(missing))
    }
}
