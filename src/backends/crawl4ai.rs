use crate::backends::Backend;
use crate::config::Config;
use crate::crawler::{build_http_client, send_for_json, FetchError};
use crate::BenchError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Renders pages through a local Crawl4AI service
///
/// The service runs a headless browser on the operator's machine, so this
/// backend is rate limited like a direct fetch.
pub struct Crawl4aiBackend {
    client: Client,
    endpoint: String,
}

impl Crawl4aiBackend {
    pub fn new(config: &Config) -> Result<Self, BenchError> {
        Ok(Self {
            client: build_http_client(&config.crawler)?,
            endpoint: config.endpoints.crawl4ai.trim_end_matches('/').to_string(),
        })
    }
}

/// Pulls the first crawl result out of a service response
fn first_result(body: &Value) -> Option<&Value> {
    body.get("results")
        .and_then(|results| results.get(0))
        .or_else(|| body.get("result"))
}

/// Reads markdown (plain or `{raw_markdown}`), falling back to cleaned HTML
fn result_text(result: &Value) -> String {
    let markdown = match result.get("markdown") {
        Some(Value::String(text)) => Some(text.as_str()),
        Some(Value::Object(map)) => map.get("raw_markdown").and_then(Value::as_str),
        _ => None,
    };

    markdown
        .filter(|text| !text.is_empty())
        .or_else(|| result.get("cleaned_html").and_then(Value::as_str))
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl Backend for Crawl4aiBackend {
    fn name(&self) -> &str {
        "crawl4ai"
    }

    fn uses_local_network(&self) -> bool {
        true
    }

    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        Ok(self.fetch_text_and_html(url).await?.0)
    }

    async fn fetch_text_and_html(&self, url: &str) -> Result<(String, Option<String>), FetchError> {
        let request = self
            .client
            .post(format!("{}/crawl", self.endpoint))
            .json(&json!({ "urls": [url] }));
        let body = send_for_json(url, request).await?;

        let result = first_result(&body)
            .ok_or_else(|| FetchError::Decode("Crawl4AI response has no results".to_string()))?;

        if result.get("success").and_then(Value::as_bool) == Some(false) {
            let message = result
                .get("error_message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(FetchError::Decode(format!("Crawl4AI failed: {}", message)));
        }

        let html = result
            .get("html")
            .and_then(Value::as_str)
            .filter(|html| !html.is_empty())
            .map(str::to_string);

        Ok((result_text(result), html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn backend_for(server: &MockServer) -> Crawl4aiBackend {
        let mut config = Config::default();
        config.endpoints.crawl4ai = server.uri();
        Crawl4aiBackend::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_reads_raw_markdown_and_html() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/crawl"))
            .and(body_json(json!({ "urls": ["https://example.com"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{
                    "success": true,
                    "markdown": { "raw_markdown": "# Example" },
                    "html": "<h1>Example</h1>"
                }]
            })))
            .mount(&server)
            .await;

        let backend = backend_for(&server).await;
        let (text, html) = backend
            .fetch_text_and_html("https://example.com")
            .await
            .unwrap();
        assert_eq!(text, "# Example");
        assert_eq!(html.as_deref(), Some("<h1>Example</h1>"));
    }

    #[tokio::test]
    async fn test_falls_back_to_cleaned_html() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{ "success": true, "markdown": "", "cleaned_html": "<p>hi</p>" }]
            })))
            .mount(&server)
            .await;

        let backend = backend_for(&server).await;
        assert_eq!(backend.fetch_text("https://example.com").await.unwrap(), "<p>hi</p>");
    }

    #[tokio::test]
    async fn test_unsuccessful_crawl_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{ "success": false, "error_message": "net::ERR_NAME_NOT_RESOLVED" }]
            })))
            .mount(&server)
            .await;

        let backend = backend_for(&server).await;
        let err = backend.fetch_text("https://example.com").await.unwrap_err();
        assert!(err.to_string().contains("Crawl4AI failed: net::ERR_NAME_NOT_RESOLVED"));
    }
}
