use crate::backends::html_text::html_to_text;
use crate::backends::Backend;
use crate::config::Config;
use crate::crawler::{build_http_client, send_for_text, FetchError};
use crate::BenchError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;

/// Fetches pages directly with browser-like headers and converts the HTML
///
/// Runs from the operator's own network, so it is rate limited and its raw
/// HTML is used for link discovery.
pub struct CustomHtmlBackend {
    client: Client,
}

impl CustomHtmlBackend {
    pub fn new(config: &Config) -> Result<Self, BenchError> {
        Ok(Self {
            client: build_http_client(&config.crawler)?,
        })
    }

    fn browser_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert("DNT", HeaderValue::from_static("1"));
        headers.insert("Upgrade-Insecure-Requests", HeaderValue::from_static("1"));
        headers
    }
}

#[async_trait]
impl Backend for CustomHtmlBackend {
    fn name(&self) -> &str {
        "custom_html"
    }

    fn uses_local_network(&self) -> bool {
        true
    }

    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        Ok(self.fetch_text_and_html(url).await?.0)
    }

    async fn fetch_text_and_html(&self, url: &str) -> Result<(String, Option<String>), FetchError> {
        let request = self.client.get(url).headers(Self::browser_headers());
        let html = send_for_text(url, request).await?;

        let text = html_to_text(&html);
        if text.trim().is_empty() {
            return Err(FetchError::EmptyContent(
                "CustomHTML extraction returned empty content".to_string(),
            ));
        }

        Ok((text, Some(html)))
    }
}
