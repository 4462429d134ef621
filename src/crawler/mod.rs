//! Crawler module for turning a domain into page content
//!
//! This module contains the core crawling logic, including:
//! - Link discovery and canonicalization
//! - Per-host rate limiting for local backends
//! - Bounded retries with exponential backoff
//! - The per-domain crawl algorithm

mod fetcher;
mod links;
mod orchestrator;
mod rate_limiter;
mod retry;

pub use fetcher::{build_http_client, check_status, send_for_json, send_for_text, FetchError};
pub use links::{
    filter_by_pages, prioritize_preferred, requested_path, DiscoveredLinks, LinkExtractor, PREFERRED_PATHS,
};
pub use orchestrator::{Crawler, DEFAULT_MAX_PAGES};
pub use rate_limiter::DomainRateLimiter;
pub use retry::RetryPolicy;
