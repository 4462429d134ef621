//! HTML to markdown
//!
//! Used by the backends that receive raw HTML. Page chrome and non-content
//! subtrees are removed with `scraper`, then `htmd` renders the rest.

use scraper::{Html, Selector};

/// Elements whose whole subtree is discarded before conversion
const SKIPPED_TAGS: &[&str] = &[
    "head", "script", "style", "noscript", "nav", "footer", "svg", "template", "iframe", "img",
];

/// Converts an HTML document to markdown
///
/// # Example
///
/// ```
/// use scrape_bench::backends::html_to_text;
///
/// let text = html_to_text("<h2>Plans</h2><p>From <a href=\"/pricing\">ten dollars</a></p>");
/// assert!(text.contains("## Plans"));
/// assert!(text.contains("[ten dollars](/pricing)"));
/// ```
pub fn html_to_text(html: &str) -> String {
    let cleaned = strip_skipped(html);
    let markdown = htmd::convert(&cleaned).unwrap_or_else(|e| {
        tracing::debug!("markdown conversion failed, using plain text: {}", e);
        Html::parse_document(&cleaned)
            .root_element()
            .text()
            .collect::<Vec<_>>()
            .join(" ")
    });
    tidy(&markdown)
}

/// Serializes the document without the subtrees in [`SKIPPED_TAGS`]
fn strip_skipped(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut result = document.root_element().html();

    let mut skipped: Vec<String> = SKIPPED_TAGS
        .iter()
        .filter_map(|tag| Selector::parse(tag).ok())
        .flat_map(|selector| {
            document
                .select(&selector)
                .map(|element| element.html())
                .collect::<Vec<_>>()
        })
        .collect();
    // Outer subtrees first so nested matches do not break their parents
    skipped.sort_by_key(|fragment| std::cmp::Reverse(fragment.len()));

    for fragment in &skipped {
        result = result.replace(fragment.as_str(), "");
    }

    result
}

/// Trims line ends and keeps at most one blank line in a row
fn tidy(markdown: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in markdown.lines().map(str::trim_end) {
        if line.trim().is_empty() && lines.last().map_or(true, |l| l.is_empty()) {
            continue;
        }
        lines.push(if line.trim().is_empty() { "" } else { line });
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}
