//! Per-domain crawl algorithm
//!
//! A crawl fetches the homepage, discovers internal links on it, puts
//! `/pricing` and `/about` first, applies the page filter and budget, then
//! fetches each remaining page. Page failures are collected, never raised.

use crate::backends::Backend;
use crate::crawler::links::{filter_by_pages, prioritize_preferred, requested_path, LinkExtractor};
use crate::crawler::{DomainRateLimiter, FetchError, RetryPolicy};
use crate::types::{CrawlResult, PAGE_SEPARATOR};
use crate::url::{normalize_base, page_name, parse_base};
use crate::BenchError;
use chrono::Utc;
use indexmap::IndexMap;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// Page budget used when the caller does not give one
pub const DEFAULT_MAX_PAGES: usize = 10;

/// Crawls domains through one backend
pub struct Crawler {
    backend: Arc<dyn Backend>,
    limiter: Option<Arc<DomainRateLimiter>>,
    retry: RetryPolicy,
    links: LinkExtractor,
}

impl Crawler {
    /// Creates a crawler for `backend`
    ///
    /// The shared `limiter` is only used if the backend fetches from the
    /// operator's own network.
    pub fn new(
        backend: Arc<dyn Backend>,
        retry: RetryPolicy,
        limiter: Arc<DomainRateLimiter>,
    ) -> Result<Self, BenchError> {
        let limiter = backend.uses_local_network().then_some(limiter);
        Ok(Self {
            backend,
            limiter,
            retry,
            links: LinkExtractor::new()?,
        })
    }

    /// Crawls one domain
    ///
    /// # Arguments
    ///
    /// * `domain` - Bare or scheme-qualified domain
    /// * `pages` - Optional path allow-list (e.g. `["pricing", "about"]`)
    /// * `max_pages` - Maximum number of non-homepage pages to fetch
    ///
    /// # Returns
    ///
    /// A `CrawlResult`. Failed pages are listed in its `error` field; the
    /// crawl itself never fails.
    pub async fn crawl(&self, domain: &str, pages: Option<&[String]>, max_pages: usize) -> CrawlResult {
        let started = Instant::now();
        let backend = self.backend.name();

        let base_str = normalize_base(domain);
        let base = match parse_base(&base_str) {
            Ok(base) => base,
            Err(e) => return CrawlResult::failed(domain, backend, e.to_string()),
        };

        let mut errors: Vec<String> = Vec::new();
        let mut page_contents: IndexMap<String, String> = IndexMap::new();

        // Homepage first; local backends also hand back raw HTML for discovery
        let want_html = self.backend.uses_local_network();
        let (homepage, homepage_html) = self
            .fetch_page("homepage", &base_str, &base, want_html, &mut errors)
            .await;
        if !homepage.trim().is_empty() {
            page_contents.insert("homepage".to_string(), homepage.clone());
        }

        let source = homepage_html
            .as_deref()
            .filter(|html| !html.is_empty())
            .unwrap_or(&homepage);
        let discovered = self.links.discover(source, &base);
        let internal_links = discovered.internal.len();
        let external_links = discovered.external.len();

        let mut candidates = prioritize_preferred(discovered.internal, &base);
        if let Some(pages) = pages.filter(|pages| !pages.is_empty()) {
            let filtered = filter_by_pages(&candidates, pages);
            if !filtered.is_empty() {
                candidates = filtered;
            }
        }
        candidates.truncate(max_pages);
        let internal_crawled = candidates.len();

        // Nothing to discover from, but the caller named pages: go straight to them
        if candidates.is_empty() {
            if let Some(pages) = pages {
                candidates = requested_pages(&base, pages);
                candidates.truncate(max_pages);
            }
        }

        for url in &candidates {
            let name = page_name(url);
            if page_contents.contains_key(&name) {
                continue;
            }
            let (content, _) = self
                .fetch_page(&name, url.as_str(), url, false, &mut errors)
                .await;
            if !content.trim().is_empty() {
                page_contents.insert(name, content);
            }
        }

        let raw_content = page_contents
            .iter()
            .map(|(name, text)| format!("## Page: {}\n\n{}", name, text))
            .collect::<Vec<_>>()
            .join(PAGE_SEPARATOR);

        let duration = started.elapsed();
        tracing::info!(
            domain,
            backend,
            pages = page_contents.len(),
            internal = internal_links,
            external = external_links,
            failed = errors.len(),
            duration_ms = duration.as_millis() as u64,
            "crawl finished"
        );

        CrawlResult {
            domain: domain.to_string(),
            crawler: backend.to_string(),
            raw_content,
            page_contents,
            crawled_at: Utc::now(),
            homepage_internal_links: internal_links,
            homepage_total_links: internal_links + external_links,
            homepage_external_links: external_links,
            homepage_internal_links_crawled: internal_crawled,
            error: (!errors.is_empty()).then(|| errors.join("; ")),
            duration_seconds: duration.as_secs_f64(),
        }
    }

    /// Fetches one page through the retry policy and rate limiter
    ///
    /// On exhaustion the last error is recorded as `"{page} ({url}): {error}"`
    /// and empty content is returned.
    async fn fetch_page(
        &self,
        page: &str,
        url: &str,
        parsed: &Url,
        with_html: bool,
        errors: &mut Vec<String>,
    ) -> (String, Option<String>) {
        let host = parsed.host_str().unwrap_or_default();

        let result = self
            .retry
            .run(|_attempt| async move {
                if let Some(limiter) = &self.limiter {
                    limiter.acquire(host).await;
                }
                if with_html {
                    self.backend.fetch_text_and_html(url).await
                } else {
                    self.backend.fetch_text(url).await.map(|text| (text, None))
                }
            })
            .await;

        match result {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::warn!(backend = self.backend.name(), page, url, "page failed: {}", e);
                errors.push(format_page_error(page, url, &e));
                (String::new(), None)
            }
        }
    }
}

fn format_page_error(page: &str, url: &str, error: &FetchError) -> String {
    format!("{} ({}): {}", page, url, error)
}

/// Resolves requested pages (paths or absolute URLs) against the base URL
fn requested_pages(base: &Url, pages: &[String]) -> Vec<Url> {
    let mut seen = Vec::new();
    for page in pages {
        let path = requested_path(page);
        if path.is_empty() {
            continue;
        }
        if let Ok(url) = base.join(&format!("/{}", path)) {
            if !seen.contains(&url) {
                seen.push(url);
            }
        }
    }
    seen
}
