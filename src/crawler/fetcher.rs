//! HTTP plumbing shared by the backend adapters
//!
//! This module handles:
//! - Building HTTP clients with timeouts and a browser-like user agent
//! - Classifying transport failures and HTTP statuses into `FetchError`
//! - Reading response bodies with a bounded error excerpt

use crate::config::CrawlerConfig;
use reqwest::{Client, Response};
use std::time::Duration;
use thiserror::Error;

/// How much of an error body is kept in a status error
const ERROR_BODY_EXCERPT: usize = 200;

/// Why a single URL fetch failed
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("TLS error for {url}: {message}")]
    Tls { url: String, message: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("{0}")]
    EmptyContent(String),

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Returns true for failures worth backing off before retrying
    ///
    /// | Condition | Transient |
    /// |-----------|-----------|
    /// | HTTP 429, 403, 503 | yes |
    /// | Timeout, connect, TLS, other network | yes |
    /// | Other statuses, empty content, decode errors | no |
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Status { status, .. } => matches!(status, 429 | 403 | 503),
            Self::Timeout { .. } | Self::Connect { .. } | Self::Tls { .. } | Self::Network { .. } => {
                true
            }
            Self::EmptyContent(_) | Self::Decode(_) => false,
        }
    }

    /// Returns true for statuses that also earn a fixed cooldown (429 and 403)
    pub fn needs_cooldown(&self) -> bool {
        matches!(self, Self::Status { status: 429 | 403, .. })
    }

    /// Maps a reqwest error to a fetch error
    pub fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        let url = url.to_string();
        if error.is_timeout() {
            return Self::Timeout { url };
        }

        let message = error_chain(&error);
        if message.to_lowercase().contains("certificate") || message.to_lowercase().contains("tls") {
            Self::Tls { url, message }
        } else if error.is_connect() {
            Self::Connect { url, message }
        } else if error.is_decode() {
            Self::Decode(message)
        } else {
            Self::Network { url, message }
        }
    }
}

/// Flattens an error and its sources into one line
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The crawler configuration (timeout and user agent)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Passes a successful response through, or turns it into `FetchError::Status`
///
/// The error carries the numeric status and the first 200 characters of body.
pub async fn check_status(response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(FetchError::Status {
        status: status.as_u16(),
        body: body.chars().take(ERROR_BODY_EXCERPT).collect(),
    })
}

/// Sends a request and reads the body as text, classifying every failure
pub async fn send_for_text(url: &str, request: reqwest::RequestBuilder) -> Result<String, FetchError> {
    let response = request
        .send()
        .await
        .map_err(|e| FetchError::from_reqwest(url, e))?;
    let response = check_status(response).await?;
    response
        .text()
        .await
        .map_err(|e| FetchError::from_reqwest(url, e))
}

/// Sends a request and decodes a JSON body, classifying every failure
pub async fn send_for_json(
    url: &str,
    request: reqwest::RequestBuilder,
) -> Result<serde_json::Value, FetchError> {
    let text = send_for_text(url, request).await?;
    serde_json::from_str(&text).map_err(|e| FetchError::Decode(e.to_string()))
}
