use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variables holding API keys, with the provider they feed
pub const API_KEY_VARS: &[(&str, &str)] = &[
    ("FIRECRAWL_API_KEY", "firecrawl"),
    ("JINA_API_KEY", "jina"),
    ("SCRAPINGBEE_API_KEY", "scrapingbee"),
    ("SCRAPERAPI_API_KEY", "scraperapi"),
    ("OPENAI_API_KEY", "openai"),
    ("ANTHROPIC_API_KEY", "anthropic"),
];

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use scrape_bench::config::load_config;
///
/// let config = load_config(Path::new("bench.toml")).unwrap();
/// println!("Max pages: {}", config.crawler.max_pages);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    // Read the configuration file
    let content = std::fs::read_to_string(path)?;

    // Parse TOML
    let config: Config = toml::from_str(&content)?;

    // Validate the configuration
    validate(&config)?;

    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Recorded in the report so results can be tied to the settings that made them.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Overlays environment values onto a configuration
///
/// `lookup` resolves a variable name to its value. Recognized variables are
/// the API key variables in [`API_KEY_VARS`] plus `GROUND_TRUTH_PATH`,
/// `OUTPUT_DIR`, `CRAWLER_TIMEOUT`, `CRAWLER_MAX_RETRIES` and
/// `MIN_DELAY_BETWEEN_REQUESTS` (seconds, may be fractional).
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    for (var, provider) in API_KEY_VARS {
        if let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) {
            config.api_keys.set(provider, value);
        }
    }

    if let Some(path) = lookup("GROUND_TRUTH_PATH") {
        config.output.ground_truth_path = path;
    }
    if let Some(dir) = lookup("OUTPUT_DIR") {
        config.output.output_dir = dir;
    }
    if let Some(value) = lookup("CRAWLER_TIMEOUT") {
        config.crawler.timeout_secs = parse_env("CRAWLER_TIMEOUT", &value)?;
    }
    if let Some(value) = lookup("CRAWLER_MAX_RETRIES") {
        config.crawler.max_retries = parse_env("CRAWLER_MAX_RETRIES", &value)?;
    }
    if let Some(value) = lookup("MIN_DELAY_BETWEEN_REQUESTS") {
        let seconds: f64 = parse_env("MIN_DELAY_BETWEEN_REQUESTS", &value)?;
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(ConfigError::InvalidEnv {
                name: "MIN_DELAY_BETWEEN_REQUESTS".to_string(),
                value,
            });
        }
        config.crawler.min_delay_ms = (seconds * 1000.0).round() as u64;
    }

    Ok(())
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        name: name.to_string(),
        value: value.to_string(),
    })
}

/// Loads variables from an env file into the process environment
///
/// An explicit path must exist. Without one, a `.env` in the working
/// directory is loaded if present.
pub fn load_env_file(path: Option<&Path>) -> Result<(), ConfigError> {
    match path {
        Some(path) => dotenvy::from_path(path).map_err(|e| {
            ConfigError::Validation(format!("Failed to load env file {}: {}", path.display(), e))
        }),
        None => {
            if let Err(e) = dotenvy::dotenv() {
                if !e.not_found() {
                    tracing::warn!("Ignoring unreadable .env file: {}", e);
                }
            }
            Ok(())
        }
    }
}

/// Builds the effective configuration for a run
///
/// Reads the TOML file if one is given (defaults otherwise), overlays the
/// process environment and validates the result.
///
/// # Returns
///
/// The configuration and, when a file was read, its content hash
pub fn resolve_config(path: Option<&Path>) -> Result<(Config, Option<String>), ConfigError> {
    let (mut config, hash) = match path {
        Some(path) => {
            let (config, hash) = load_config_with_hash(path)?;
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate(&config)?;

    Ok((config, hash))
}

/// Shortens a secret for logging: `abcd...wxyz`, or `MISSING`
pub fn mask_key(key: Option<&str>) -> String {
    match key {
        None => "MISSING".to_string(),
        Some(key) if key.chars().count() <= 8 => "***".to_string(),
        Some(key) => {
            let head: String = key.chars().take(4).collect();
            let tail: String = key
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("{}...{}", head, tail)
        }
    }
}
