use crate::crawler::FetchError;
use async_trait::async_trait;

/// One way of turning a URL into page text
///
/// Implementors only need [`Backend::fetch_text`]. Backends that can hand back
/// the raw HTML they fetched override [`Backend::fetch_text_and_html`] so the
/// crawl orchestrator can discover links from real markup.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Identifier used in results and cache paths, e.g. `jina`
    fn name(&self) -> &str;

    /// True when requests leave from the operator's own network
    ///
    /// Such backends are rate limited per host and their raw HTML is
    /// preferred for link discovery.
    fn uses_local_network(&self) -> bool {
        false
    }

    /// Fetches one URL and returns its text or markdown content
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;

    /// Fetches one URL and returns its text plus the raw HTML, if available
    async fn fetch_text_and_html(&self, url: &str) -> Result<(String, Option<String>), FetchError> {
        Ok((self.fetch_text(url).await?, None))
    }
}
