use crate::parser::ContentParser;
use crate::types::{CrawlResult, ParsedContent, PAGE_SEPARATOR};
use crate::BenchError;
use indexmap::IndexMap;
use regex::Regex;

/// Characters kept per cleaned page
pub const MAX_CHARS_PER_PAGE: usize = 25_000;

/// Characters kept in the combined document
pub const MAX_TOTAL_CHARS: usize = 200_000;

/// Appended to any text cut at a size cap
pub const TRUNCATION_MARKER: &str = "\n\n[...truncated]";

/// Cleans markdown-ish crawl output for LLM consumption
///
/// # Cleaning Steps
///
/// 1. Collapse runs of 4+ newlines to 3
/// 2. Drop linked images, then inline images
/// 3. Replace long base64 image data URIs with `[base64-image]`
/// 4. Drop cookie-banner lines
/// 5. Trim every line, collapse 3+ newlines to 2, trim the result
#[derive(Debug, Clone)]
pub struct MarkdownParser {
    many_newlines: Regex,
    linked_image: Regex,
    inline_image: Regex,
    base64_image: Regex,
    cookie_banner: Regex,
    blank_runs: Regex,
}

impl MarkdownParser {
    pub fn new() -> Result<Self, BenchError> {
        Ok(Self {
            many_newlines: Regex::new(r"\n{4,}")?,
            linked_image: Regex::new(r"\[\s*!\[[^\]]*\]\([^)]+\)\s*\]\([^)]+\)")?,
            inline_image: Regex::new(r"!\[[^\]]*\]\([^)]+\)")?,
            base64_image: Regex::new(r"data:image/[^;]+;base64,[A-Za-z0-9+/=]{100,}")?,
            cookie_banner: Regex::new(
                r"(?i)(we use cookies|cookie policy|accept all|reject all|manage preferences).*?\n",
            )?,
            blank_runs: Regex::new(r"\n{3,}")?,
        })
    }

    /// Cleans one page of text
    pub fn clean(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let text = self.many_newlines.replace_all(text, "\n\n\n");
        let text = self.linked_image.replace_all(&text, "");
        let text = self.inline_image.replace_all(&text, "");
        let text = self.base64_image.replace_all(&text, "[base64-image]");
        let text = self.cookie_banner.replace_all(&text, "");

        let text = text.split('\n').map(str::trim).collect::<Vec<_>>().join("\n");
        let text = self.blank_runs.replace_all(&text, "\n\n");
        text.trim().to_string()
    }
}

/// Cuts `text` to `limit` characters, marking the cut
fn truncate(text: String, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
        None => text,
    }
}

impl ContentParser for MarkdownParser {
    fn parse(&self, crawl: &CrawlResult) -> ParsedContent {
        let page_sections: IndexMap<String, String> = crawl
            .page_contents
            .iter()
            .map(|(name, raw)| (name.clone(), truncate(self.clean(raw), MAX_CHARS_PER_PAGE)))
            .collect();

        let combined = page_sections
            .iter()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(name, text)| format!("# PAGE: {}\n\n{}", name.to_uppercase(), text))
            .collect::<Vec<_>>()
            .join(PAGE_SEPARATOR);
        let markdown = truncate(combined, MAX_TOTAL_CHARS);

        ParsedContent {
            domain: crawl.domain.clone(),
            crawler: crawl.crawler.clone(),
            char_count: markdown.chars().count(),
            markdown,
            page_sections,
        }
    }
}
