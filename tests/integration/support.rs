//! Shared fixtures: fast configs, canned backends and scripted extractors

use async_trait::async_trait;
use chrono::Utc;
use scrape_bench::backends::{Backend, BackendRegistry};
use scrape_bench::config::Config;
use scrape_bench::crawler::FetchError;
use scrape_bench::extractor::{feature_names, Extractor, ExtractorRegistry};
use scrape_bench::scorer::GroundTruthScorer;
use scrape_bench::{BenchError, BenchmarkPipeline, ExtractedFeatures, ParsedContent};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const ACME: &str = "https://acme.com";

/// Ground truth matching what [`ScriptedExtractor::accurate`] returns
pub fn ground_truth_for(url: &str) -> String {
    format!(
        r#"{{"company": "Acme", "url": "{}", "features": {{"language": {{"present": true, "value": "English"}}, "product_category": {{"present": true, "value": "B2B"}}, "industries": {{"present": true, "value": ["SaaS"]}}}}}}"#,
        url
    )
}

/// Config with short timeouts and near-zero backoff
pub fn fast_config(output_dir: &Path) -> Config {
    let mut config = Config::default();
    config.crawler.timeout_secs = 5;
    config.crawler.max_retries = 2;
    config.crawler.min_delay_ms = 5;
    config.crawler.retry_base_ms = 1;
    config.crawler.cooldown_ms = 0;
    config.output.output_dir = output_dir.display().to_string();
    config
}

/// A pipeline over `output_dir` scored against `ground_truth`
pub fn pipeline(
    output_dir: &Path,
    ground_truth: &str,
    backends: BackendRegistry,
    extractors: ExtractorRegistry,
) -> BenchmarkPipeline {
    let scorer = GroundTruthScorer::from_jsonl(ground_truth).unwrap();
    BenchmarkPipeline::new(fast_config(output_dir), Arc::new(scorer))
        .unwrap()
        .with_backends(backends)
        .with_extractors(extractors)
}

pub fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Serves fixed pages by path and counts fetches
pub struct CannedBackend {
    name: String,
    local: bool,
    pages: HashMap<String, String>,
    pub calls: Arc<AtomicUsize>,
}

impl CannedBackend {
    pub fn new(name: &str, local: bool, pages: &[(&str, &str)]) -> Self {
        Self {
            name: name.to_string(),
            local,
            pages: pages
                .iter()
                .map(|(path, body)| (path.to_string(), body.to_string()))
                .collect(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A backend whose homepage links to `/about` and `/pricing`
    pub fn site(name: &str, local: bool) -> Self {
        Self::new(
            name,
            local,
            &[
                ("/", "# Acme\n\n[About](/about) [Pricing](/pricing) [X](https://x.com/acme)"),
                ("/about", "Acme builds B2B SaaS in English."),
                ("/pricing", "Plans from $10."),
            ],
        )
    }

    /// Registers a backend that shares this one's page set and call counter
    pub fn register(&self, registry: &mut BackendRegistry) {
        let name = self.name.clone();
        let local = self.local;
        let pages = self.pages.clone();
        let calls = self.calls.clone();
        registry.register(&self.name.clone(), move |_config| {
            Ok(Arc::new(CannedBackend {
                name: name.clone(),
                local,
                pages: pages.clone(),
                calls: calls.clone(),
            }) as Arc<dyn Backend>)
        });
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for CannedBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn uses_local_network(&self) -> bool {
        self.local
    }

    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let path = url::Url::parse(url)
            .map(|u| u.path().to_string())
            .unwrap_or_default();
        self.pages
            .get(&path)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                status: 404,
                body: format!("no page at {}", path),
            })
    }
}

/// What a [`ScriptedExtractor`] does when called
#[derive(Clone)]
pub enum Script {
    /// Returns these feature values
    Features(Vec<(&'static str, Value)>),
    /// Returns `Err(Extraction)`
    Fail(&'static str),
    /// Returns features with the `error` field set
    Degraded(&'static str),
}

/// Extractor with a fixed outcome that counts its calls
pub struct ScriptedExtractor {
    name: String,
    script: Script,
    calls: Arc<AtomicUsize>,
}

impl ScriptedExtractor {
    /// Features that agree with [`ground_truth_for`]
    pub fn accurate() -> Script {
        Script::Features(vec![
            ("language", json!("English")),
            ("product_category", json!("B2B")),
            ("industries", json!(["SaaS"])),
        ])
    }

    /// Registers `name` with `script`; returns the shared call counter
    pub fn register(registry: &mut ExtractorRegistry, name: &str, script: Script) -> Arc<AtomicUsize> {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let owned = name.to_string();
        registry.register(name, move |_config| {
            Ok(Arc::new(ScriptedExtractor {
                name: owned.clone(),
                script: script.clone(),
                calls: counter.clone(),
            }) as Arc<dyn Extractor>)
        });
        calls
    }

    fn features(&self, values: &[(&'static str, Value)]) -> BTreeMap<String, Value> {
        let mut features: BTreeMap<String, Value> = feature_names()
            .into_iter()
            .map(|name| (name.to_string(), Value::Null))
            .collect();
        for (name, value) in values {
            features.insert(name.to_string(), value.clone());
        }
        features
    }
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn extract(&self, parsed: &ParsedContent) -> Result<ExtractedFeatures, BenchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (features, error) = match &self.script {
            Script::Features(values) => (self.features(values), None),
            Script::Fail(message) => return Err(BenchError::Extraction(message.to_string())),
            Script::Degraded(message) => (self.features(&[]), Some(message.to_string())),
        };
        Ok(ExtractedFeatures {
            domain: parsed.domain.clone(),
            crawler: parsed.crawler.clone(),
            llm: self.name.clone(),
            extracted_at: Utc::now(),
            features,
            raw_llm_response: String::new(),
            error,
        })
    }
}

/// Registry holding only the given backends
pub fn backends(list: &[&CannedBackend]) -> BackendRegistry {
    let mut registry = BackendRegistry::empty();
    for backend in list {
        backend.register(&mut registry);
    }
    registry
}
