//! Content parsing
//!
//! Turns raw crawl output into cleaned, size-capped text for extractors.

mod markdown;

pub use markdown::{MarkdownParser, MAX_CHARS_PER_PAGE, MAX_TOTAL_CHARS, TRUNCATION_MARKER};

use crate::types::{CrawlResult, ParsedContent};

/// Derives extractor input from a crawl
///
/// Implementations must be pure: the same crawl always yields the same
/// content, and the crawl is never modified.
pub trait ContentParser: Send + Sync {
    fn parse(&self, crawl: &CrawlResult) -> ParsedContent;
}
