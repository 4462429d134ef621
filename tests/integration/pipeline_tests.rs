//! Integration tests for the benchmark pipeline
//!
//! Backends and extractors are in-process fakes so these tests can count
//! every crawl and model call and check what lands in the artifact cache.

use crate::support::{
    backends, ground_truth_for, names, pipeline, CannedBackend, Script, ScriptedExtractor, ACME,
};
use async_trait::async_trait;
use scrape_bench::backends::{Backend, BackendRegistry};
use scrape_bench::crawler::FetchError;
use scrape_bench::extractor::{ExtractorRegistry, ValueComparator};
use scrape_bench::storage::FsArtifactStore;
use scrape_bench::types::FeatureSimilarity;
use scrape_bench::{BenchError, RunOptions};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn one_extractor(name: &str, script: Script) -> (ExtractorRegistry, Arc<AtomicUsize>) {
    let mut registry = ExtractorRegistry::empty();
    let calls = ScriptedExtractor::register(&mut registry, name, script);
    (registry, calls)
}

#[tokio::test]
async fn test_second_run_is_served_from_cache() {
    let dir = TempDir::new().unwrap();
    let site = CannedBackend::site("jina", false);
    let (extractors, llm_calls) = one_extractor("openai", ScriptedExtractor::accurate());
    let bench = pipeline(dir.path(), &ground_truth_for(ACME), backends(&[&site]), extractors);
    let options = RunOptions::default();

    let first = bench
        .run(&names(&[ACME]), &names(&["jina"]), &names(&["openai"]), &options)
        .await;
    assert_eq!(site.call_count(), 3);
    assert_eq!(llm_calls.load(Ordering::SeqCst), 1);
    assert!(first.results[0].errors.is_empty());
    assert!(first.results[0].overall_accuracy > 0.0);

    let artifact = FsArtifactStore::new(dir.path()).artifact_path(ACME, "jina", "openai");
    let saved = std::fs::read(&artifact).unwrap();

    let second = bench
        .run(&names(&[ACME]), &names(&["jina"]), &names(&["openai"]), &options)
        .await;

    assert_eq!(site.call_count(), 3, "no crawl on the second run");
    assert_eq!(llm_calls.load(Ordering::SeqCst), 1, "no model call on the second run");
    assert_eq!(std::fs::read(&artifact).unwrap(), saved);
    assert_eq!(first.results, second.results);
}

#[tokio::test]
async fn test_no_cache_runs_everything_live() {
    let dir = TempDir::new().unwrap();
    let site = CannedBackend::site("jina", false);
    let (extractors, llm_calls) = one_extractor("openai", ScriptedExtractor::accurate());
    let bench = pipeline(dir.path(), &ground_truth_for(ACME), backends(&[&site]), extractors);
    let options = RunOptions {
        use_cache: false,
        ..RunOptions::default()
    };

    for _ in 0..2 {
        bench
            .run(&names(&[ACME]), &names(&["jina"]), &names(&["openai"]), &options)
            .await;
    }

    assert_eq!(site.call_count(), 6);
    assert_eq!(llm_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cached_crawl_is_reused_for_a_new_extractor() {
    let dir = TempDir::new().unwrap();
    let site = CannedBackend::site("jina", false);
    let mut extractors = ExtractorRegistry::empty();
    let openai = ScriptedExtractor::register(&mut extractors, "openai", ScriptedExtractor::accurate());
    let claude = ScriptedExtractor::register(&mut extractors, "claude", ScriptedExtractor::accurate());
    let bench = pipeline(dir.path(), &ground_truth_for(ACME), backends(&[&site]), extractors);
    let options = RunOptions::default();

    bench
        .run(&names(&[ACME]), &names(&["jina"]), &names(&["openai"]), &options)
        .await;
    let report = bench
        .run(&names(&[ACME]), &names(&["jina"]), &names(&["openai", "claude"]), &options)
        .await;

    assert_eq!(site.call_count(), 3);
    assert_eq!(openai.load(Ordering::SeqCst), 1);
    assert_eq!(claude.load(Ordering::SeqCst), 1);
    assert_eq!(report.results.len(), 2);
    assert!(report.results.iter().all(|r| r.errors.is_empty()));
}

#[tokio::test]
async fn test_failing_extractor_does_not_affect_others() {
    let dir = TempDir::new().unwrap();
    let site = CannedBackend::site("jina", false);
    let mut extractors = ExtractorRegistry::empty();
    for name in ["one", "two", "three", "four"] {
        ScriptedExtractor::register(&mut extractors, name, ScriptedExtractor::accurate());
    }
    ScriptedExtractor::register(&mut extractors, "broken", Script::Fail("model unavailable"));
    let bench = pipeline(dir.path(), &ground_truth_for(ACME), backends(&[&site]), extractors);

    let report = bench
        .run(
            &names(&[ACME]),
            &names(&["jina"]),
            &names(&["one", "two", "broken", "three", "four"]),
            &RunOptions::default(),
        )
        .await;

    assert_eq!(report.results.len(), 5);
    let broken = &report.results[2];
    assert_eq!(broken.llm, "broken");
    assert_eq!(broken.overall_accuracy, 0.0);
    assert_eq!(broken.errors, vec!["Extraction failed: model unavailable".to_string()]);

    let healthy: Vec<_> = report.results.iter().filter(|r| r.llm != "broken").collect();
    assert_eq!(healthy.len(), 4);
    for result in healthy {
        assert!(result.errors.is_empty());
        assert_eq!(result.overall_accuracy, report.results[0].overall_accuracy);
    }

    let store = FsArtifactStore::new(dir.path());
    assert!(!store.artifact_path(ACME, "jina", "broken").exists());
    assert!(store.artifact_path(ACME, "jina", "one").exists());
}

#[tokio::test]
async fn test_degraded_extraction_is_scored_but_not_cached() {
    let dir = TempDir::new().unwrap();
    let site = CannedBackend::site("jina", false);
    let (extractors, calls) = one_extractor("openai", Script::Degraded("unparseable response"));
    let bench = pipeline(dir.path(), &ground_truth_for(ACME), backends(&[&site]), extractors);

    let report = bench
        .run(&names(&[ACME]), &names(&["jina"]), &names(&["openai"]), &RunOptions::default())
        .await;

    assert_eq!(report.results[0].features_found, 0);
    assert!(!FsArtifactStore::new(dir.path())
        .artifact_path(ACME, "jina", "openai")
        .exists());

    bench
        .run(&names(&[ACME]), &names(&["jina"]), &names(&["openai"]), &RunOptions::default())
        .await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_dont_save_intermediate() {
    let dir = TempDir::new().unwrap();
    let site = CannedBackend::site("jina", false);
    let (extractors, _) = one_extractor("openai", ScriptedExtractor::accurate());
    let bench = pipeline(dir.path(), &ground_truth_for(ACME), backends(&[&site]), extractors);
    let options = RunOptions {
        save_intermediate: false,
        ..RunOptions::default()
    };

    bench
        .run(&names(&[ACME]), &names(&["jina"]), &names(&["openai"]), &options)
        .await;

    assert!(!FsArtifactStore::new(dir.path())
        .artifact_path(ACME, "jina", "openai")
        .exists());
}

#[tokio::test]
async fn test_cache_only_reports_missing_artifacts() {
    let dir = TempDir::new().unwrap();
    let site = CannedBackend::site("jina", false);
    let (extractors, calls) = one_extractor("openai", ScriptedExtractor::accurate());
    let bench = pipeline(dir.path(), &ground_truth_for(ACME), backends(&[&site]), extractors);
    let options = RunOptions {
        cache_only: true,
        ..RunOptions::default()
    };

    let report = bench
        .run(&names(&[ACME]), &names(&["jina"]), &names(&["openai"]), &options)
        .await;

    assert_eq!(site.call_count(), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].overall_accuracy, 0.0);
    assert_eq!(
        report.results[0].errors,
        vec![format!("Missing cached artifact for {} jina", ACME)]
    );
}

#[tokio::test]
async fn test_backend_construction_failure_is_isolated() {
    let dir = TempDir::new().unwrap();
    let site = CannedBackend::site("custom_html", true);
    let mut registry = backends(&[&site]);
    registry.register("firecrawl", |_config| {
        Err(BenchError::MissingCredential {
            name: "firecrawl".to_string(),
            variable: "FIRECRAWL_API_KEY".to_string(),
        })
    });
    let mut extractors = ExtractorRegistry::empty();
    ScriptedExtractor::register(&mut extractors, "openai", ScriptedExtractor::accurate());
    ScriptedExtractor::register(&mut extractors, "claude", ScriptedExtractor::accurate());
    let bench = pipeline(dir.path(), &ground_truth_for(ACME), registry, extractors);

    let report = bench
        .run(
            &names(&[ACME]),
            &names(&["firecrawl", "custom_html"]),
            &names(&["openai", "claude"]),
            &RunOptions::default(),
        )
        .await;

    assert_eq!(report.results.len(), 4);
    for result in &report.results[..2] {
        assert_eq!(result.crawler, "firecrawl");
        assert_eq!(
            result.errors,
            vec!["Crawl failed: firecrawl requires FIRECRAWL_API_KEY to be set".to_string()]
        );
    }
    for result in &report.results[2..] {
        assert_eq!(result.crawler, "custom_html");
        assert!(result.errors.is_empty());
    }
}

#[tokio::test]
async fn test_total_crawl_failure_yields_error_results() {
    let dir = TempDir::new().unwrap();
    let empty = CannedBackend::new("jina", false, &[]);
    let (extractors, calls) = one_extractor("openai", ScriptedExtractor::accurate());
    let bench = pipeline(dir.path(), &ground_truth_for(ACME), backends(&[&empty]), extractors);

    let report = bench
        .run(&names(&[ACME]), &names(&["jina"]), &names(&["openai"]), &RunOptions::default())
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    let errors = &report.results[0].errors;
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Crawl failed: homepage"), "{}", errors[0]);
    assert!(errors[0].contains("404"));
}

#[tokio::test]
async fn test_results_list_remote_backends_before_local() {
    let dir = TempDir::new().unwrap();
    let local = CannedBackend::site("custom_html", true);
    let jina = CannedBackend::site("jina", false);
    let firecrawl = CannedBackend::site("firecrawl", false);
    let (extractors, _) = one_extractor("openai", ScriptedExtractor::accurate());
    let bench = pipeline(
        dir.path(),
        &ground_truth_for(ACME),
        backends(&[&local, &jina, &firecrawl]),
        extractors,
    );

    let report = bench
        .run(
            &names(&[ACME]),
            &names(&["custom_html", "jina", "firecrawl"]),
            &names(&["openai"]),
            &RunOptions::default(),
        )
        .await;

    let order: Vec<&str> = report.results.iter().map(|r| r.crawler.as_str()).collect();
    assert_eq!(order, vec!["jina", "firecrawl", "custom_html"]);
    assert_eq!(report.summary_by_crawler.len(), 3);
}

#[tokio::test]
async fn test_domains_are_processed_in_order() {
    let dir = TempDir::new().unwrap();
    let site = CannedBackend::site("jina", false);
    let (extractors, _) = one_extractor("openai", ScriptedExtractor::accurate());
    let truth = format!("{}\n{}", ground_truth_for(ACME), ground_truth_for("https://beta.io"));
    let bench = pipeline(dir.path(), &truth, backends(&[&site]), extractors);

    let report = bench
        .run(
            &names(&["https://beta.io", ACME]),
            &names(&["jina"]),
            &names(&["openai"]),
            &RunOptions::default(),
        )
        .await;

    let domains: Vec<&str> = report.results.iter().map(|r| r.domain.as_str()).collect();
    assert_eq!(domains, vec!["https://beta.io", ACME]);
    assert_eq!(report.total_domains, 2);
}

#[tokio::test]
async fn test_missing_ground_truth_is_reported() {
    let dir = TempDir::new().unwrap();
    let site = CannedBackend::site("jina", false);
    let (extractors, _) = one_extractor("openai", ScriptedExtractor::accurate());
    let bench = pipeline(
        dir.path(),
        &ground_truth_for("https://other.com"),
        backends(&[&site]),
        extractors,
    );

    let report = bench
        .run(&names(&[ACME]), &names(&["jina"]), &names(&["openai"]), &RunOptions::default())
        .await;

    assert_eq!(
        report.results[0].errors,
        vec![format!("No ground truth found for {}", ACME)]
    );
}

#[tokio::test]
async fn test_page_budget_limits_fetches() {
    let dir = TempDir::new().unwrap();
    let site = CannedBackend::site("jina", false);
    let (extractors, _) = one_extractor("openai", ScriptedExtractor::accurate());
    let bench = pipeline(dir.path(), &ground_truth_for(ACME), backends(&[&site]), extractors);
    let options = RunOptions {
        max_pages: 1,
        ..RunOptions::default()
    };

    let report = bench
        .run(&names(&[ACME]), &names(&["jina"]), &names(&["openai"]), &options)
        .await;

    // homepage plus one internal page; /pricing is preferred
    assert_eq!(site.call_count(), 2);
    let result = &report.results[0];
    assert_eq!(result.homepage_internal_links, 2);
    assert_eq!(result.homepage_internal_links_crawled, 1);
    assert_eq!(result.homepage_external_links, 1);
    assert_eq!(result.homepage_total_links, 3);

    let artifact = FsArtifactStore::new(dir.path()).artifact_path(ACME, "jina", "openai");
    let saved: Value = serde_json::from_str(&std::fs::read_to_string(artifact).unwrap()).unwrap();
    let pages: Vec<&String> = saved["crawl"]["page_contents"].as_object().unwrap().keys().collect();
    assert_eq!(pages.len(), 2);
}

/// Scores every feature it is asked about at a fixed similarity
struct FixedComparator {
    similarity: f64,
    calls: AtomicUsize,
}

#[async_trait]
impl ValueComparator for FixedComparator {
    async fn compare(
        &self,
        extracted: &BTreeMap<String, Value>,
        _ground_truth: &BTreeMap<String, Value>,
    ) -> Result<Vec<FeatureSimilarity>, BenchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(extracted
            .keys()
            .map(|feature| FeatureSimilarity {
                feature: feature.clone(),
                similarity: self.similarity,
                rationale: String::new(),
            })
            .collect())
    }
}

#[tokio::test]
async fn test_llm_compare_uses_cached_extractions_only() {
    let dir = TempDir::new().unwrap();
    let site = CannedBackend::site("jina", false);
    let mut extractors = ExtractorRegistry::empty();
    let openai = ScriptedExtractor::register(&mut extractors, "openai", ScriptedExtractor::accurate());
    let claude = ScriptedExtractor::register(&mut extractors, "claude", ScriptedExtractor::accurate());
    let comparator = Arc::new(FixedComparator {
        similarity: 0.9,
        calls: AtomicUsize::new(0),
    });
    let bench = pipeline(dir.path(), &ground_truth_for(ACME), backends(&[&site]), extractors)
        .with_comparator(comparator.clone());

    bench
        .run(&names(&[ACME]), &names(&["jina"]), &names(&["openai"]), &RunOptions::default())
        .await;

    let options = RunOptions {
        llm_compare: true,
        ..RunOptions::default()
    };
    let report = bench
        .run(&names(&[ACME]), &names(&["jina"]), &names(&["openai", "claude"]), &options)
        .await;

    assert_eq!(site.call_count(), 3);
    assert_eq!(openai.load(Ordering::SeqCst), 1);
    assert_eq!(claude.load(Ordering::SeqCst), 0);

    let compared = &report.results[0];
    assert!((compared.overall_accuracy - 0.9).abs() < 1e-9);
    assert!(compared
        .feature_scores
        .iter()
        .all(|fs| fs.match_type == "llm_similarity"));

    assert_eq!(
        report.results[1].errors,
        vec![format!("Missing cached artifact for {} jina/claude", ACME)]
    );

    let store = FsArtifactStore::new(dir.path());
    assert!(store.comparison_path(ACME, "jina", "openai").exists());

    bench
        .run(&names(&[ACME]), &names(&["jina"]), &names(&["openai"]), &options)
        .await;
    assert_eq!(comparator.calls.load(Ordering::SeqCst), 1, "stored comparison reused");
}

#[tokio::test]
async fn test_unknown_extractor_is_an_error_result() {
    let dir = TempDir::new().unwrap();
    let site = CannedBackend::site("jina", false);
    let bench = pipeline(
        dir.path(),
        &ground_truth_for(ACME),
        backends(&[&site]),
        ExtractorRegistry::empty(),
    );

    let report = bench
        .run(&names(&[ACME]), &names(&["jina"]), &names(&["gemini"]), &RunOptions::default())
        .await;

    assert_eq!(report.results[0].errors, vec!["Unknown extractor: gemini".to_string()]);
}

#[tokio::test]
async fn test_empty_backend_registry_reports_unknown_crawler() {
    let dir = TempDir::new().unwrap();
    let (extractors, _) = one_extractor("openai", ScriptedExtractor::accurate());
    let bench = pipeline(dir.path(), &ground_truth_for(ACME), BackendRegistry::empty(), extractors);

    let report = bench
        .run(&names(&[ACME]), &names(&["selenium"]), &names(&["openai"]), &RunOptions::default())
        .await;

    assert_eq!(
        report.results[0].errors,
        vec!["Crawl failed: Unknown crawler: selenium".to_string()]
    );
}

/// Remote backend that serves a one-page site slowly and tracks overlap
struct SlowBackend {
    name: &'static str,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

#[async_trait]
impl Backend for SlowBackend {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch_text(&self, _url: &str) -> Result<String, FetchError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok("Acme builds B2B SaaS in English.".to_string())
    }
}

struct PanickingBackend;

#[async_trait]
impl Backend for PanickingBackend {
    fn name(&self) -> &str {
        "scraperapi"
    }

    async fn fetch_text(&self, _url: &str) -> Result<String, FetchError> {
        panic!("boom")
    }
}

#[tokio::test]
async fn test_remote_crawls_overlap_and_panics_stay_contained() {
    let dir = TempDir::new().unwrap();
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let mut registry = BackendRegistry::empty();
    for name in ["jina", "firecrawl", "scrapingbee"] {
        let active = active.clone();
        let peak = peak.clone();
        registry.register(name, move |_config| {
            Ok(Arc::new(SlowBackend {
                name,
                active: active.clone(),
                peak: peak.clone(),
            }) as Arc<dyn Backend>)
        });
    }
    registry.register("scraperapi", |_config| Ok(Arc::new(PanickingBackend) as Arc<dyn Backend>));
    let (extractors, _) = one_extractor("openai", ScriptedExtractor::accurate());
    let bench = pipeline(dir.path(), &ground_truth_for(ACME), registry, extractors);

    let report = bench
        .run(
            &names(&[ACME]),
            &names(&["jina", "scraperapi", "firecrawl", "scrapingbee"]),
            &names(&["openai"]),
            &RunOptions::default(),
        )
        .await;

    assert_eq!(peak.load(Ordering::SeqCst), 3);
    assert_eq!(report.results.len(), 4);

    let panicked = report
        .results
        .iter()
        .find(|r| r.crawler == "scraperapi")
        .unwrap();
    assert_eq!(panicked.errors.len(), 1);
    assert!(
        panicked.errors[0].starts_with("Crawl failed: Crawl task failed: "),
        "{:?}",
        panicked.errors
    );
    assert_eq!(panicked.overall_accuracy, 0.0);

    for result in report.results.iter().filter(|r| r.crawler != "scraperapi") {
        assert!(result.errors.is_empty(), "{}: {:?}", result.crawler, result.errors);
        assert!(result.overall_accuracy > 0.0);
    }
}

#[tokio::test]
async fn test_repeated_names_run_once() {
    let dir = TempDir::new().unwrap();
    let site = CannedBackend::site("jina", false);
    let (extractors, llm_calls) = one_extractor("openai", ScriptedExtractor::accurate());
    let bench = pipeline(dir.path(), &ground_truth_for(ACME), backends(&[&site]), extractors);

    let report = bench
        .run(
            &names(&[ACME]),
            &names(&["jina", "jina"]),
            &names(&["openai", "openai"]),
            &RunOptions::default(),
        )
        .await;

    assert_eq!(site.call_count(), 3);
    assert_eq!(llm_calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.total_combinations, 1);
    assert_eq!(report.results.len(), 1);
    assert!(report.results[0].errors.is_empty());
}

#[tokio::test]
async fn test_locality_is_taken_from_the_backend() {
    let dir = TempDir::new().unwrap();
    // A backend registered under a paid-API name that fetches locally
    let jina = CannedBackend::site("jina", true);
    let firecrawl = CannedBackend::site("firecrawl", false);
    let (extractors, _) = one_extractor("openai", ScriptedExtractor::accurate());
    let bench = pipeline(
        dir.path(),
        &ground_truth_for(ACME),
        backends(&[&jina, &firecrawl]),
        extractors,
    );

    let report = bench
        .run(
            &names(&[ACME]),
            &names(&["jina", "firecrawl"]),
            &names(&["openai"]),
            &RunOptions::default(),
        )
        .await;

    let order: Vec<&str> = report.results.iter().map(|r| r.crawler.as_str()).collect();
    assert_eq!(order, vec!["firecrawl", "jina"]);
}
