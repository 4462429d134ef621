//! Link discovery for crawled pages
//!
//! This module pulls hyperlinks out of raw page content, which may be HTML or
//! markdown-like text depending on the backend:
//! - `href="..."` attributes
//! - markdown inline links `[text](url)`
//! - markdown autolinks `<https://...>`
//!
//! Links are resolved against the base URL, filtered, deduplicated by their
//! canonical form and split into internal and external sets.

use crate::url::{canonical_url, classify_host, LinkScope};
use regex::Regex;
use std::collections::HashSet;
use url::Url;

/// Link prefixes that never lead to a crawlable document
const SKIP_PREFIXES: &[&str] = &["#", "mailto:", "tel:", "javascript:", "data:"];

/// Path fragments that indicate an authentication flow
const SKIP_PATH_TOKENS: &[&str] = &[
    "/login",
    "/log-in",
    "/signin",
    "/sign-in",
    "/signup",
    "/sign-up",
    "/register",
    "/auth",
    "/authenticate",
    "/oauth",
    "/sso",
];

/// File extensions that are not documents
const SKIP_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".ico", ".css", ".js", ".json", ".xml",
    ".pdf", ".zip", ".rar", ".mp4", ".mp3", ".woff", ".woff2", ".ttf", ".eot",
];

/// Pages moved to the front of the crawl order when the homepage links to them
pub const PREFERRED_PATHS: &[&str] = &["pricing", "about"];

/// Links found on one page, split by scope
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveredLinks {
    /// Same-site links in first-seen order
    pub internal: Vec<Url>,
    /// Off-site links in first-seen order
    pub external: Vec<Url>,
}

impl DiscoveredLinks {
    pub fn total(&self) -> usize {
        self.internal.len() + self.external.len()
    }
}

/// Extracts and classifies links from page content
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    href: Regex,
    markdown_inline: Regex,
    markdown_auto: Regex,
}

impl LinkExtractor {
    /// Compiles the link patterns
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            href: Regex::new(r#"(?i)href\s*=\s*["']([^"']+)["']"#)?,
            markdown_inline: Regex::new(r"\[[^\]]+\]\(([^)]+)\)")?,
            markdown_auto: Regex::new(r"<(https?://[^>]+)>")?,
        })
    }

    /// Returns raw link tokens in pattern order, then match order
    fn raw_links<'a>(&self, content: &'a str) -> Vec<&'a str> {
        let mut links = Vec::new();
        for pattern in [&self.href, &self.markdown_inline, &self.markdown_auto] {
            links.extend(
                pattern
                    .captures_iter(content)
                    .filter_map(|caps| caps.get(1))
                    .map(|m| m.as_str()),
            );
        }
        links
    }

    /// Discovers internal and external links in `content`
    ///
    /// # Link Filtering Rules
    ///
    /// **Excluded:**
    /// - Empty tokens, fragments, `mailto:`, `tel:`, `javascript:`, `data:`
    /// - Anything that does not resolve to an http(s) URL with a host
    /// - Paths containing an authentication token (`/login`, `/oauth`, ...)
    /// - Paths ending in a non-document extension (`.png`, `.css`, `.pdf`, ...)
    /// - The base URL itself, and any canonical duplicate
    ///
    /// Returned URLs keep their query string; only the fragment is dropped.
    ///
    /// # Example
    ///
    /// ```
    /// use scrape_bench::crawler::LinkExtractor;
    /// use url::Url;
    ///
    /// let extractor = LinkExtractor::new().unwrap();
    /// let base = Url::parse("https://example.com").unwrap();
    /// let links = extractor.discover(r#"<a href="/about">About</a> [X](https://x.com)"#, &base);
    /// assert_eq!(links.internal.len(), 1);
    /// assert_eq!(links.external.len(), 1);
    /// ```
    pub fn discover(&self, content: &str, base: &Url) -> DiscoveredLinks {
        let mut discovered = DiscoveredLinks::default();
        if content.is_empty() {
            return discovered;
        }

        let base_host = base.host_str().unwrap_or_default();
        let base_canonical = canonical_url(base);
        let mut seen: HashSet<String> = HashSet::new();

        for raw in self.raw_links(content) {
            let Some(url) = resolve_link(raw, base) else {
                continue;
            };

            let canonical = canonical_url(&url);
            if canonical == base_canonical || !seen.insert(canonical) {
                continue;
            }

            let host = url.host_str().unwrap_or_default();
            match classify_host(host, base_host) {
                LinkScope::Internal => discovered.internal.push(url),
                LinkScope::External => discovered.external.push(url),
            }
        }

        discovered
    }
}

/// Resolves a raw link token to an absolute crawlable URL
///
/// Returns None if the link should be excluded.
fn resolve_link(raw: &str, base: &Url) -> Option<Url> {
    let cleaned = raw.trim();
    if cleaned.is_empty() {
        return None;
    }

    let lowered = cleaned.to_ascii_lowercase();
    if SKIP_PREFIXES.iter().any(|prefix| lowered.starts_with(prefix)) {
        return None;
    }

    let mut url = base.join(cleaned).ok()?;
    url.set_fragment(None);

    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    if url.host_str().map_or(true, str::is_empty) {
        return None;
    }

    let path = url.path().to_lowercase();
    if SKIP_PATH_TOKENS.iter().any(|token| path.contains(token)) {
        return None;
    }
    if SKIP_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return None;
    }

    Some(url)
}

/// Moves `/pricing` and `/about` to the front when they were discovered
///
/// Relative order of every other link is unchanged.
pub fn prioritize_preferred(links: Vec<Url>, base: &Url) -> Vec<Url> {
    let preferred: Vec<String> = PREFERRED_PATHS
        .iter()
        .filter_map(|path| base.join(&format!("/{}", path)).ok())
        .map(|url| canonical_url(&url))
        .collect();

    let mut front: Vec<Option<Url>> = vec![None; preferred.len()];
    let mut rest = Vec::with_capacity(links.len());

    for url in links {
        let canonical = canonical_url(&url);
        match preferred.iter().position(|p| *p == canonical) {
            Some(idx) if front[idx].is_none() => front[idx] = Some(url),
            _ => rest.push(url),
        }
    }

    front.into_iter().flatten().chain(rest).collect()
}

/// Reduces a requested page to its path without surrounding slashes
///
/// Absolute URLs keep only their path, so `https://example.com/pricing/`
/// and `/pricing` both become `pricing`.
pub fn requested_path(page: &str) -> String {
    let page = page.trim();
    let path = match Url::parse(page) {
        Ok(url) if url.has_host() => url.path().to_string(),
        _ => page.to_string(),
    };
    path.trim_matches('/').to_string()
}

/// Keeps only links whose path matches one of `pages`
///
/// Matching ignores case and surrounding slashes, so `"/Pricing/"` matches
/// `https://example.com/pricing`. Pages may also be absolute URLs.
pub fn filter_by_pages(links: &[Url], pages: &[String]) -> Vec<Url> {
    let wanted: HashSet<String> = pages
        .iter()
        .map(|p| requested_path(p).to_lowercase())
        .filter(|p| !p.is_empty())
        .collect();

    links
        .iter()
        .filter(|url| wanted.contains(&url.path().trim_matches('/').to_lowercase()))
        .cloned()
        .collect()
}
