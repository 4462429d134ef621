//! Third-party scraping APIs
//!
//! These services fetch from their own infrastructure and absorb concurrency
//! themselves, so none of them is rate limited locally.

use crate::backends::html_text::html_to_text;
use crate::backends::Backend;
use crate::config::Config;
use crate::crawler::{build_http_client, send_for_json, send_for_text, FetchError};
use crate::BenchError;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::{json, Value};

/// Client, credential and endpoint shared by every API adapter
struct ApiClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl ApiClient {
    fn new(config: &Config, provider: &str, variable: &str, endpoint: &str) -> Result<Self, BenchError> {
        let api_key = config
            .api_keys
            .get(provider)
            .ok_or_else(|| BenchError::MissingCredential {
                name: provider.to_string(),
                variable: variable.to_string(),
            })?
            .to_string();

        Ok(Self {
            client: build_http_client(&config.crawler)?,
            api_key,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

/// Jina Reader: `GET {endpoint}/{url}` returns markdown
pub struct JinaBackend {
    api: ApiClient,
}

impl JinaBackend {
    pub fn new(config: &Config) -> Result<Self, BenchError> {
        Ok(Self {
            api: ApiClient::new(config, "jina", "JINA_API_KEY", &config.endpoints.jina)?,
        })
    }
}

#[async_trait]
impl Backend for JinaBackend {
    fn name(&self) -> &str {
        "jina"
    }

    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let request = self
            .api
            .client
            .get(format!("{}/{}", self.api.endpoint, url))
            .bearer_auth(&self.api.api_key)
            .header(ACCEPT, "text/markdown")
            .header("X-Return-Format", "markdown");
        send_for_text(url, request).await
    }
}

/// Firecrawl scrape API: POST a JSON job, read `data.markdown`
pub struct FirecrawlBackend {
    api: ApiClient,
}

impl FirecrawlBackend {
    pub fn new(config: &Config) -> Result<Self, BenchError> {
        Ok(Self {
            api: ApiClient::new(config, "firecrawl", "FIRECRAWL_API_KEY", &config.endpoints.firecrawl)?,
        })
    }
}

#[async_trait]
impl Backend for FirecrawlBackend {
    fn name(&self) -> &str {
        "firecrawl"
    }

    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let request = self
            .api
            .client
            .post(&self.api.endpoint)
            .bearer_auth(&self.api.api_key)
            .json(&json!({
                "url": url,
                "formats": ["markdown"],
                "excludeTags": ["img"],
                "removeBase64Images": true,
            }));
        let body = send_for_json(url, request).await?;

        Ok(body
            .pointer("/data/markdown")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}

/// ScrapingBee: proxied raw HTML, converted to text locally
pub struct ScrapingBeeBackend {
    api: ApiClient,
}

impl ScrapingBeeBackend {
    pub fn new(config: &Config) -> Result<Self, BenchError> {
        Ok(Self {
            api: ApiClient::new(
                config,
                "scrapingbee",
                "SCRAPINGBEE_API_KEY",
                &config.endpoints.scrapingbee,
            )?,
        })
    }
}

#[async_trait]
impl Backend for ScrapingBeeBackend {
    fn name(&self) -> &str {
        "scrapingbee"
    }

    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let request = self.api.client.get(&self.api.endpoint).query(&[
            ("api_key", self.api.api_key.as_str()),
            ("url", url),
            ("render_js", "false"),
        ]);
        let html = send_for_text(url, request).await?;

        let text = html_to_text(&html);
        if text.trim().is_empty() {
            return Err(FetchError::EmptyContent(
                "ScrapingBee returned empty content after extraction".to_string(),
            ));
        }
        Ok(text)
    }
}

/// ScraperAPI: proxied fetch with server-side markdown conversion
pub struct ScraperApiBackend {
    api: ApiClient,
}

impl ScraperApiBackend {
    pub fn new(config: &Config) -> Result<Self, BenchError> {
        Ok(Self {
            api: ApiClient::new(
                config,
                "scraperapi",
                "SCRAPERAPI_API_KEY",
                &config.endpoints.scraperapi,
            )?,
        })
    }
}

#[async_trait]
impl Backend for ScraperApiBackend {
    fn name(&self) -> &str {
        "scraperapi"
    }

    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let request = self.api.client.get(&self.api.endpoint).query(&[
            ("api_key", self.api.api_key.as_str()),
            ("url", url),
            ("output_format", "markdown"),
            ("render", "false"),
        ]);
        send_for_text(url, request).await
    }
}
