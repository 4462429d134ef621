//! Crawler backends
//!
//! Six interchangeable ways of turning a URL into text:
//! - `custom_html` and `crawl4ai` fetch from the operator's machine
//! - `jina`, `firecrawl`, `scrapingbee` and `scraperapi` call paid APIs
//!
//! Backends are created by name through a [`BackendRegistry`], so callers
//! (and tests) can swap in their own implementations.

mod crawl4ai;
mod custom_html;
mod html_text;
mod remote;
mod traits;

pub use crawl4ai::Crawl4aiBackend;
pub use custom_html::CustomHtmlBackend;
pub use html_text::html_to_text;
pub use remote::{FirecrawlBackend, JinaBackend, ScraperApiBackend, ScrapingBeeBackend};
pub use traits::Backend;

use crate::config::Config;
use crate::BenchError;
use indexmap::IndexMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The built-in backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Firecrawl,
    Crawl4ai,
    Jina,
    ScrapingBee,
    ScraperApi,
    CustomHtml,
}

impl BackendKind {
    pub const ALL: [BackendKind; 6] = [
        BackendKind::Firecrawl,
        BackendKind::Crawl4ai,
        BackendKind::Jina,
        BackendKind::ScrapingBee,
        BackendKind::ScraperApi,
        BackendKind::CustomHtml,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Firecrawl => "firecrawl",
            Self::Crawl4ai => "crawl4ai",
            Self::Jina => "jina",
            Self::ScrapingBee => "scrapingbee",
            Self::ScraperApi => "scraperapi",
            Self::CustomHtml => "custom_html",
        }
    }

    /// Constructs the backend
    pub fn create(&self, config: &Config) -> Result<Arc<dyn Backend>, BenchError> {
        Ok(match self {
            Self::Firecrawl => Arc::new(FirecrawlBackend::new(config)?),
            Self::Crawl4ai => Arc::new(Crawl4aiBackend::new(config)?),
            Self::Jina => Arc::new(JinaBackend::new(config)?),
            Self::ScrapingBee => Arc::new(ScrapingBeeBackend::new(config)?),
            Self::ScraperApi => Arc::new(ScraperApiBackend::new(config)?),
            Self::CustomHtml => Arc::new(CustomHtmlBackend::new(config)?),
        })
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| BenchError::UnknownComponent {
                kind: "crawler",
                name: s.to_string(),
            })
    }
}

/// Builds a backend from the run configuration
pub type BackendFactory = Arc<dyn Fn(&Config) -> Result<Arc<dyn Backend>, BenchError> + Send + Sync>;

/// Maps backend names to constructors
///
/// Whether a backend is local (rate limited, crawled one at a time) is
/// answered by the constructed backend through
/// [`Backend::uses_local_network`].
pub struct BackendRegistry {
    entries: IndexMap<String, BackendFactory>,
}

impl BackendRegistry {
    /// A registry with no backends
    pub fn empty() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Registers (or replaces) a backend under `name`
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&Config) -> Result<Arc<dyn Backend>, BenchError> + Send + Sync + 'static,
    {
        self.entries.insert(name.to_string(), Arc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Constructs the backend registered under `name`
    pub fn create(&self, name: &str, config: &Config) -> Result<Arc<dyn Backend>, BenchError> {
        let factory = self
            .entries
            .get(name)
            .ok_or_else(|| BenchError::UnknownComponent {
                kind: "crawler",
                name: name.to_string(),
            })?;
        factory(config)
    }
}

impl Default for BackendRegistry {
    /// A registry holding the six built-in backends
    fn default() -> Self {
        let mut registry = Self::empty();
        for kind in BackendKind::ALL {
            registry.register(kind.as_str(), move |config| kind.create(config));
        }
        registry
    }
}
