//! Benchmark run over domains × backends × extractors
//!
//! Domains run one after another. Within a domain every remote backend
//! crawls concurrently, then local backends crawl one at a time. Each
//! (backend, extractor) pair then extracts, scores and caches on its own, so
//! one failure never costs another combination its result.

use crate::backends::{Backend, BackendRegistry};
use crate::config::Config;
use crate::crawler::{Crawler, DomainRateLimiter, RetryPolicy, DEFAULT_MAX_PAGES};
use crate::extractor::{apply_comparison, ExtractorRegistry, OpenAiComparator, ValueComparator};
use crate::parser::{ContentParser, MarkdownParser};
use crate::pipeline::summary::build_report;
use crate::scorer::{GroundTruthScorer, Scorer};
use crate::state::{Stage, StageTracker};
use crate::storage::{open_store, Artifact, ArtifactStore};
use crate::types::{BenchmarkReport, CrawlResult, EvaluationResult, ExtractedFeatures, ParsedContent};
use crate::BenchError;
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Per-run switches
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Optional page allow-list passed to every crawl
    pub pages: Option<Vec<String>>,
    /// Maximum non-homepage pages per crawl
    pub max_pages: usize,
    /// Reuse cached artifacts when present
    pub use_cache: bool,
    /// Never crawl; a missing artifact is an error result
    pub cache_only: bool,
    /// Persist live extractions
    pub save_intermediate: bool,
    /// Re-score with a comparison model (implies `cache_only`)
    pub llm_compare: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            pages: None,
            max_pages: DEFAULT_MAX_PAGES,
            use_cache: true,
            cache_only: false,
            save_intermediate: true,
            llm_compare: false,
        }
    }
}

impl RunOptions {
    fn is_cache_only(&self) -> bool {
        self.cache_only || self.llm_compare
    }

    fn reads_cache(&self) -> bool {
        self.use_cache || self.is_cache_only()
    }
}

/// Where one backend's content comes from
enum CrawlSource {
    /// Live crawl output, not yet parsed
    Live(CrawlResult),
    /// Crawl and parsed content from an artifact
    Cached(CrawlResult, ParsedContent),
    /// Cache-only run without an artifact
    Missing,
}

/// A requested backend, constructed once per run
struct RunBackend<'a> {
    name: &'a str,
    backend: Result<Arc<dyn Backend>, String>,
}

impl RunBackend<'_> {
    /// Backends that could not be built count as remote
    fn is_local(&self) -> bool {
        self.backend
            .as_ref()
            .is_ok_and(|backend| backend.uses_local_network())
    }
}

/// Orchestrates crawling, extraction, scoring and caching
pub struct BenchmarkPipeline {
    config: Config,
    backends: BackendRegistry,
    extractors: ExtractorRegistry,
    parser: Arc<dyn ContentParser>,
    scorer: Arc<dyn Scorer>,
    store: Arc<dyn ArtifactStore>,
    comparator: Option<Arc<dyn ValueComparator>>,
    limiter: Arc<DomainRateLimiter>,
    retry: RetryPolicy,
    config_hash: Option<String>,
}

impl BenchmarkPipeline {
    /// Builds a pipeline with the built-in backends and extractors
    ///
    /// Ground truth is loaded from `output.ground-truth-path` and artifacts
    /// live under `output.output-dir`.
    pub fn from_config(config: Config) -> Result<Self, BenchError> {
        let scorer = GroundTruthScorer::from_path(Path::new(&config.output.ground_truth_path))?;
        Self::new(config, Arc::new(scorer))
    }

    /// Builds a pipeline around an existing scorer
    pub fn new(config: Config, scorer: Arc<dyn Scorer>) -> Result<Self, BenchError> {
        let store = open_store(Path::new(&config.output.output_dir));
        let limiter = Arc::new(DomainRateLimiter::new(Duration::from_millis(
            config.crawler.min_delay_ms,
        )));
        let retry = RetryPolicy::from_config(&config.crawler);

        Ok(Self {
            backends: BackendRegistry::default(),
            extractors: ExtractorRegistry::default(),
            parser: Arc::new(MarkdownParser::new()?),
            scorer,
            store,
            comparator: None,
            limiter,
            retry,
            config_hash: None,
            config,
        })
    }

    pub fn with_backends(mut self, backends: BackendRegistry) -> Self {
        self.backends = backends;
        self
    }

    pub fn with_extractors(mut self, extractors: ExtractorRegistry) -> Self {
        self.extractors = extractors;
        self
    }

    pub fn with_parser(mut self, parser: Arc<dyn ContentParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn ArtifactStore>) -> Self {
        self.store = store;
        self
    }

    /// Uses `comparator` for `--llm-compare` runs instead of the OpenAI default
    pub fn with_comparator(mut self, comparator: Arc<dyn ValueComparator>) -> Self {
        self.comparator = Some(comparator);
        self
    }

    /// Records the config hash in every report
    pub fn with_config_hash(mut self, hash: String) -> Self {
        self.config_hash = Some(hash);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs every (domain, backend, extractor) combination
    ///
    /// Never fails: each combination that cannot be completed is reported as
    /// a zero-accuracy result carrying the reason.
    pub async fn run(
        &self,
        domains: &[String],
        backends: &[String],
        extractors: &[String],
        options: &RunOptions,
    ) -> BenchmarkReport {
        let backends = unique_names("crawler", backends);
        let extractors = unique_names("extractor", extractors);
        let total = domains.len() * backends.len() * extractors.len();
        let comparator = if options.llm_compare {
            self.comparator_for_run()
        } else {
            None
        };

        tracing::info!(
            domains = domains.len(),
            backends = backends.len(),
            extractors = extractors.len(),
            "Starting benchmark: {} combinations",
            total
        );

        let run_backends = self.prepare_backends(&backends);

        let mut results = Vec::with_capacity(total);
        for domain in domains {
            tracing::info!(domain = %domain, "Processing domain");
            let domain_results = self
                .run_domain(domain, &run_backends, &extractors, options, comparator.as_deref())
                .await;
            results.extend(domain_results);
            tracing::info!("Progress: {}/{}", results.len(), total);
        }

        build_report(results, self.config_hash.clone())
    }

    fn comparator_for_run(&self) -> Option<Arc<dyn ValueComparator>> {
        if let Some(comparator) = &self.comparator {
            return Some(comparator.clone());
        }

        let Some(api_key) = self.config.api_keys.get("openai") else {
            tracing::warn!("LLM comparison requested but OPENAI_API_KEY is not set; keeping rule-based scores");
            return None;
        };
        match OpenAiComparator::new(api_key, &self.config.endpoints.openai, &self.config.models.compare) {
            Ok(comparator) => Some(Arc::new(comparator)),
            Err(e) => {
                tracing::warn!("LLM comparison unavailable: {}", e);
                None
            }
        }
    }

    /// Builds every requested backend; failures are kept per backend
    fn prepare_backends<'a>(&self, names: &'a [String]) -> Vec<RunBackend<'a>> {
        names
            .iter()
            .map(|name| {
                let backend = self.backends.create(name, &self.config).map_err(|e| {
                    tracing::error!(backend = %name, "Backend init error: {}", e);
                    e.to_string()
                });
                RunBackend {
                    name: name.as_str(),
                    backend,
                }
            })
            .collect()
    }

    async fn run_domain(
        &self,
        domain: &str,
        backends: &[RunBackend<'_>],
        extractors: &[String],
        options: &RunOptions,
        comparator: Option<&dyn ValueComparator>,
    ) -> Vec<EvaluationResult> {
        // Remote backends in request order, then local ones
        let (remote, local): (Vec<&RunBackend>, Vec<&RunBackend>) =
            backends.iter().partition(|backend| !backend.is_local());
        let mut trackers: HashMap<&str, StageTracker> = backends
            .iter()
            .map(|backend| (backend.name, StageTracker::new(domain, backend.name)))
            .collect();

        let mut sources: HashMap<&str, CrawlSource> = HashMap::new();
        let mut live_remote = Vec::new();
        let mut live_local = Vec::new();

        for backend in remote.iter().chain(local.iter()).copied() {
            match self.cached_source(domain, backend.name, options) {
                Some(source) => {
                    sources.insert(backend.name, source);
                }
                None if backend.is_local() => live_local.push(backend),
                None => live_remote.push(backend),
            }
        }

        for backend in live_remote.iter().chain(live_local.iter()) {
            if let Some(tracker) = trackers.get_mut(backend.name) {
                advance(tracker, Stage::Crawling);
            }
        }

        for (name, crawl) in self.crawl_remote(domain, &live_remote, options).await {
            sources.insert(name, CrawlSource::Live(crawl));
        }
        for backend in live_local {
            let crawl = self.crawl_one(domain, backend, options).await;
            sources.insert(backend.name, CrawlSource::Live(crawl));
        }

        let mut results = Vec::new();
        for name in remote.into_iter().chain(local).map(|backend| backend.name) {
            let (Some(source), Some(tracker)) = (sources.remove(name), trackers.get_mut(name)) else {
                continue;
            };
            results.extend(
                self.process_backend(domain, name, source, tracker, extractors, options, comparator)
                    .await,
            );
        }
        results
    }

    /// Looks up a cached crawl; `None` means crawl live
    fn cached_source(&self, domain: &str, backend: &str, options: &RunOptions) -> Option<CrawlSource> {
        if !options.reads_cache() {
            return None;
        }

        match self.store.find_any(domain, backend) {
            Some(Artifact { crawl, parsed, .. }) => {
                tracing::info!(domain = %domain, backend = %backend, "Using cached crawl");
                Some(CrawlSource::Cached(crawl, parsed))
            }
            None if options.is_cache_only() => Some(CrawlSource::Missing),
            None => None,
        }
    }

    /// Crawls remote backends concurrently
    ///
    /// Construction errors and dead tasks come back as failed crawls.
    async fn crawl_remote<'a>(
        &self,
        domain: &str,
        backends: &[&RunBackend<'a>],
        options: &RunOptions,
    ) -> Vec<(&'a str, CrawlResult)> {
        let handles = backends.iter().map(|backend| {
            let name = backend.name;
            let crawler = self.build_crawler(backend);
            let domain = domain.to_string();
            let pages = options.pages.clone();
            let max_pages = options.max_pages;

            async move {
                let crawler = match crawler {
                    Ok(crawler) => crawler,
                    Err(e) => return CrawlResult::failed(&domain, name, e),
                };

                let task_domain = domain.clone();
                let task = tokio::spawn(async move {
                    crawler.crawl(&task_domain, pages.as_deref(), max_pages).await
                });
                match task.await {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::error!(domain = %domain, backend = %name, "Crawl task failed: {}", e);
                        CrawlResult::failed(&domain, name, format!("Crawl task failed: {}", e))
                    }
                }
            }
        });

        let crawls = join_all(handles).await;
        backends.iter().map(|backend| backend.name).zip(crawls).collect()
    }

    async fn crawl_one(&self, domain: &str, backend: &RunBackend<'_>, options: &RunOptions) -> CrawlResult {
        match self.build_crawler(backend) {
            Ok(crawler) => {
                crawler
                    .crawl(domain, options.pages.as_deref(), options.max_pages)
                    .await
            }
            Err(e) => CrawlResult::failed(domain, backend.name, e),
        }
    }

    fn build_crawler(&self, backend: &RunBackend<'_>) -> Result<Crawler, String> {
        let built = backend.backend.clone()?;
        Crawler::new(built, self.retry.clone(), self.limiter.clone()).map_err(|e| e.to_string())
    }

    #[allow(clippy::too_many_arguments)]
    async fn process_backend(
        &self,
        domain: &str,
        backend: &str,
        source: CrawlSource,
        tracker: &mut StageTracker,
        extractors: &[String],
        options: &RunOptions,
        comparator: Option<&dyn ValueComparator>,
    ) -> Vec<EvaluationResult> {
        let fail_all = |tracker: &mut StageTracker, error: String| {
            advance(tracker, Stage::Done);
            extractors
                .iter()
                .map(|llm| EvaluationResult::failed(domain, backend, llm, error.clone()))
                .collect::<Vec<_>>()
        };

        let (crawl, parsed) = match source {
            CrawlSource::Missing => {
                tracing::error!(domain = %domain, backend = %backend, "Missing cached artifact");
                return fail_all(tracker, format!("Missing cached artifact for {} {}", domain, backend));
            }
            CrawlSource::Live(crawl) if crawl.is_total_failure() => {
                let error = crawl.error.clone().unwrap_or_default();
                tracing::warn!(domain = %domain, backend = %backend, "Crawl failed: {}", error);
                return fail_all(tracker, format!("Crawl failed: {}", error));
            }
            CrawlSource::Live(crawl) => {
                advance(tracker, Stage::Parsing);
                let parsed = self.parser.parse(&crawl);
                (crawl, parsed)
            }
            CrawlSource::Cached(crawl, parsed) => {
                advance(tracker, Stage::Parsing);
                (crawl, parsed)
            }
        };

        tracing::info!(
            domain = %domain,
            backend = %backend,
            pages = crawl.page_contents.len(),
            chars = parsed.char_count,
            duration_secs = crawl.duration_seconds,
            "links: {} internal ({} crawled), {} external, {} total",
            crawl.homepage_internal_links,
            crawl.homepage_internal_links_crawled,
            crawl.homepage_external_links,
            crawl.homepage_total_links
        );

        let mut results = Vec::with_capacity(extractors.len());
        for llm in extractors {
            advance(tracker, Stage::Extracting);
            let result = self
                .evaluate_extractor(&crawl, &parsed, llm, tracker, options, comparator)
                .await;
            results.push(result);
        }
        advance(tracker, Stage::Done);
        results
    }

    /// Produces the result for one (domain, backend, extractor) combination
    async fn evaluate_extractor(
        &self,
        crawl: &CrawlResult,
        parsed: &ParsedContent,
        llm: &str,
        tracker: &mut StageTracker,
        options: &RunOptions,
        comparator: Option<&dyn ValueComparator>,
    ) -> EvaluationResult {
        let domain = crawl.domain.as_str();
        let backend = crawl.crawler.as_str();

        let cached = if options.reads_cache() {
            self.store.get(domain, backend, llm)
        } else {
            None
        };

        let (extraction, live) = match cached {
            Some(artifact) => {
                tracing::info!(domain = %domain, backend = %backend, extractor = %llm, "Using cached extraction");
                (artifact.extraction, false)
            }
            None if options.llm_compare => {
                return EvaluationResult::failed(
                    domain,
                    backend,
                    llm,
                    format!("Missing cached artifact for {} {}/{}", domain, backend, llm),
                );
            }
            None => match self.extract_live(parsed, llm).await {
                Ok(extraction) => (extraction, true),
                Err(e) => {
                    tracing::error!(domain = %domain, backend = %backend, extractor = %llm, "Extraction failed: {}", e);
                    return EvaluationResult::failed(domain, backend, llm, e.to_string());
                }
            },
        };

        if let Some(error) = &extraction.error {
            tracing::warn!(domain = %domain, backend = %backend, extractor = %llm, "Extractor error: {}", error);
        }

        advance(tracker, Stage::Evaluating);
        let mut result = self.scorer.evaluate(&extraction);
        result.annotate_links(crawl);

        if let Some(comparator) = comparator {
            self.compare(&extraction, &mut result, comparator, options).await;
        }

        tracing::info!(
            domain = %domain,
            backend = %backend,
            extractor = %llm,
            "accuracy={:.0}% ({}/{} correct)",
            result.overall_accuracy * 100.0,
            result.features_correct,
            result.feature_scores.len()
        );

        if live && options.save_intermediate && extraction.error.is_none() {
            let artifact = Artifact {
                crawl: crawl.clone(),
                parsed: parsed.clone(),
                extraction,
            };
            if let Err(e) = self.store.put(&artifact) {
                tracing::warn!(domain = %domain, backend = %backend, extractor = %llm, "Failed to cache artifact: {}", e);
            }
        }

        result
    }

    async fn extract_live(&self, parsed: &ParsedContent, llm: &str) -> Result<ExtractedFeatures, BenchError> {
        let extractor = self.extractors.create(llm, &self.config)?;
        extractor.extract(parsed).await
    }

    /// Applies stored or fresh comparison scores; failures keep rule-based scores
    async fn compare(
        &self,
        extraction: &ExtractedFeatures,
        result: &mut EvaluationResult,
        comparator: &dyn ValueComparator,
        options: &RunOptions,
    ) {
        let Some(truth) = self.scorer.ground_truth_values(&extraction.domain) else {
            return;
        };
        let (domain, backend, llm) = (&extraction.domain, &extraction.crawler, &extraction.llm);

        let scores = match self.store.get_comparison(domain, backend, llm) {
            Some(scores) => scores,
            None => match comparator.compare(&extraction.features, &truth).await {
                Ok(scores) => {
                    if options.save_intermediate {
                        if let Err(e) = self.store.put_comparison(domain, backend, llm, &scores) {
                            tracing::warn!("Failed to cache comparison: {}", e);
                        }
                    }
                    scores
                }
                Err(e) => {
                    tracing::warn!(domain = %domain, backend = %backend, extractor = %llm, "LLM compare failed: {}", e);
                    return;
                }
            },
        };

        apply_comparison(result, &scores);
    }
}

/// Drops repeated names, keeping first occurrences in order
fn unique_names(kind: &str, names: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let unique: Vec<String> = names
        .iter()
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .collect();
    if unique.len() < names.len() {
        tracing::warn!("Ignoring repeated {} names: {}", kind, names.join(", "));
    }
    unique
}

fn advance(tracker: &mut StageTracker, next: Stage) {
    if let Err(e) = tracker.advance(next) {
        tracing::error!("{}", e);
    }
}
