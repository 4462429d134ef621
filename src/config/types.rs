use serde::Deserialize;

/// Main configuration structure for Scrape-Bench
///
/// Every section is optional; missing values fall back to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "api-keys")]
    pub api_keys: ApiKeys,
    pub endpoints: EndpointConfig,
    pub models: ModelConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Attempts per page, including the first
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Minimum time between requests to the same host (milliseconds)
    #[serde(rename = "min-delay-ms")]
    pub min_delay_ms: u64,

    /// Maximum number of non-homepage pages to fetch per domain
    #[serde(rename = "max-pages")]
    pub max_pages: usize,

    /// Backoff unit in milliseconds; attempt n waits base * 2^n
    #[serde(rename = "retry-base-ms")]
    pub retry_base_ms: u64,

    /// Extra wait before retrying a 429 or 403 (milliseconds)
    #[serde(rename = "cooldown-ms")]
    pub cooldown_ms: u64,

    /// User agent sent by the local fetch backends
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            max_retries: 3,
            min_delay_ms: 1000,
            max_pages: 10,
            retry_base_ms: 1000,
            cooldown_ms: 3000,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                         AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

/// API credentials for paid backends and extractors
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub firecrawl: Option<String>,
    pub jina: Option<String>,
    pub scrapingbee: Option<String>,
    pub scraperapi: Option<String>,
    pub openai: Option<String>,
    pub anthropic: Option<String>,
}

impl ApiKeys {
    /// Looks up a key by provider name, treating blank values as missing
    pub fn get(&self, provider: &str) -> Option<&str> {
        let key = match provider {
            "firecrawl" => &self.firecrawl,
            "jina" => &self.jina,
            "scrapingbee" => &self.scrapingbee,
            "scraperapi" => &self.scraperapi,
            "openai" => &self.openai,
            "anthropic" => &self.anthropic,
            _ => return None,
        };
        key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    /// Sets a key by provider name; unknown providers are ignored
    pub fn set(&mut self, provider: &str, value: String) {
        let slot = match provider {
            "firecrawl" => &mut self.firecrawl,
            "jina" => &mut self.jina,
            "scrapingbee" => &mut self.scrapingbee,
            "scraperapi" => &mut self.scraperapi,
            "openai" => &mut self.openai,
            "anthropic" => &mut self.anthropic,
            _ => return,
        };
        *slot = Some(value);
    }
}

/// Service endpoints, overridable for self-hosted services and tests
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub firecrawl: String,
    pub jina: String,
    pub scrapingbee: String,
    pub scraperapi: String,
    pub crawl4ai: String,
    pub openai: String,
    pub anthropic: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            firecrawl: "https://api.firecrawl.dev/v1/scrape".to_string(),
            jina: "https://r.jina.ai".to_string(),
            scrapingbee: "https://app.scrapingbee.com/api/v1".to_string(),
            scraperapi: "https://api.scraperapi.com".to_string(),
            crawl4ai: "http://localhost:11235".to_string(),
            openai: "https://api.openai.com/v1".to_string(),
            anthropic: "https://api.anthropic.com/v1".to_string(),
        }
    }
}

impl EndpointConfig {
    /// All endpoints with their names, for validation and dry runs
    pub fn entries(&self) -> [(&'static str, &str); 7] {
        [
            ("firecrawl", self.firecrawl.as_str()),
            ("jina", self.jina.as_str()),
            ("scrapingbee", self.scrapingbee.as_str()),
            ("scraperapi", self.scraperapi.as_str()),
            ("crawl4ai", self.crawl4ai.as_str()),
            ("openai", self.openai.as_str()),
            ("anthropic", self.anthropic.as_str()),
        ]
    }
}

/// Model identifiers for each extractor
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub openai: String,
    pub claude: String,
    pub haiku: String,
    /// Model used for the optional value-similarity comparison
    pub compare: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            openai: "gpt-4o".to_string(),
            claude: "claude-sonnet-4-20250514".to_string(),
            haiku: "claude-haiku-4-5-20251001".to_string(),
            compare: "gpt-4o".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for reports and the `intermediate/` artifact cache
    #[serde(rename = "output-dir")]
    pub output_dir: String,

    /// Path to the JSONL ground-truth file
    #[serde(rename = "ground-truth-path")]
    pub ground_truth_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: "results".to_string(),
            ground_truth_path: "verified_data.jsonl".to_string(),
        }
    }
}
