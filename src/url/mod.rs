//! URL handling module for Scrape-Bench
//!
//! This module provides base-URL normalization, canonical dedup keys, page
//! naming, cache keys, and internal/external host classification.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{domain_key, lookup_key, page_name};
pub use normalize::{canonical_url, normalize_base, normalize_host, parse_base};

/// Whether a link stays on the crawled site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkScope {
    /// Same host as the base, or a subdomain of it
    Internal,
    /// Any other host
    External,
}

/// Classifies a host relative to the crawl's base host
///
/// Both hosts are normalized first, so `www.` and case are ignored.
///
/// # Examples
///
/// ```
/// use scrape_bench::url::{classify_host, LinkScope};
///
/// assert_eq!(classify_host("www.example.com", "example.com"), LinkScope::Internal);
/// assert_eq!(classify_host("blog.example.com", "example.com"), LinkScope::Internal);
/// assert_eq!(classify_host("notexample.com", "example.com"), LinkScope::External);
/// ```
pub fn classify_host(host: &str, base_host: &str) -> LinkScope {
    let host = normalize_host(host);
    let base_host = normalize_host(base_host);

    if host == base_host || host.ends_with(&format!(".{}", base_host)) {
        LinkScope::Internal
    } else {
        LinkScope::External
    }
}
