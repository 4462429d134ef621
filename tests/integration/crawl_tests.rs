//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small site and drive the
//! `custom_html` backend through the full crawl cycle end-to-end.

use crate::support::{fast_config, ground_truth_for, names, ScriptedExtractor};
use scrape_bench::backends::CustomHtmlBackend;
use scrape_bench::config::Config;
use scrape_bench::crawler::{Crawler, DomainRateLimiter, RetryPolicy};
use scrape_bench::extractor::ExtractorRegistry;
use scrape_bench::output::{save_results, ReportFormat};
use scrape_bench::scorer::GroundTruthScorer;
use scrape_bench::storage::FsArtifactStore;
use scrape_bench::{BenchmarkPipeline, RunOptions};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><head><title>Acme</title></head><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

fn crawler(config: &Config) -> Crawler {
    let backend = CustomHtmlBackend::new(config).unwrap();
    Crawler::new(
        Arc::new(backend),
        RetryPolicy::from_config(&config.crawler),
        Arc::new(DomainRateLimiter::new(Duration::from_millis(config.crawler.min_delay_ms))),
    )
    .unwrap()
}

async fn requests_to(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == route)
        .count()
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        r#"<h1>Acme</h1><p>We build things.</p>
        <a href="/about">About</a>
        <a href="/pricing">Pricing</a>
        <a href="/login">Log in</a>
        <a href="/logo.png">Logo</a>
        <a href="mailto:hi@acme.com">Mail</a>
        <a href="https://twitter.com/acme">Twitter</a>"#,
    )
    .await;
    mount_page(&server, "/about", "<h2>About us</h2><p>Founded in 2020.</p>").await;
    mount_page(&server, "/pricing", "<p>Plans from $10 per month.</p>").await;

    let result = crawler(&fast_config(dir.path()))
        .crawl(&server.uri(), None, 10)
        .await;

    assert!(result.error.is_none(), "{:?}", result.error);
    let pages: Vec<&str> = result.page_contents.keys().map(String::as_str).collect();
    assert_eq!(pages, vec!["homepage", "/pricing", "/about"]);
    assert!(result.page_contents["/about"].contains("Founded in 2020"));
    assert!(result.raw_content.contains("## Page: homepage"));

    assert_eq!(result.homepage_internal_links, 2);
    assert_eq!(result.homepage_external_links, 1);
    assert_eq!(result.homepage_total_links, 3);
    assert_eq!(result.homepage_internal_links_crawled, 2);
    assert_eq!(requests_to(&server, "/login").await, 0);
}

#[tokio::test]
async fn test_page_budget_caps_fetches() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let links: String = (1..=5)
        .map(|i| format!(r#"<a href="/p{}">Page {}</a>"#, i, i))
        .collect();
    mount_page(&server, "/", &format!("<p>Home</p>{}", links)).await;
    for i in 1..=5 {
        mount_page(&server, &format!("/p{}", i), &format!("<p>Page {}</p>", i)).await;
    }

    let result = crawler(&fast_config(dir.path()))
        .crawl(&server.uri(), None, 2)
        .await;

    assert_eq!(result.homepage_internal_links, 5);
    assert_eq!(result.homepage_internal_links_crawled, 2);
    assert_eq!(result.page_contents.len(), 3);
    assert_eq!(server.received_requests().await.unwrap_or_default().len(), 3);
    assert_eq!(requests_to(&server, "/p3").await, 0);
}

#[tokio::test]
async fn test_requested_pages_filter_candidates() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        r#"<p>Home</p><a href="/about">About</a><a href="/careers">Careers</a><a href="/blog">Blog</a>"#,
    )
    .await;
    mount_page(&server, "/careers", "<p>Join us</p>").await;

    let pages = names(&["/Careers/"]);
    let result = crawler(&fast_config(dir.path()))
        .crawl(&server.uri(), Some(pages.as_slice()), 10)
        .await;

    let fetched: Vec<&str> = result.page_contents.keys().map(String::as_str).collect();
    assert_eq!(fetched, vec!["homepage", "/careers"]);
    assert_eq!(requests_to(&server, "/about").await, 0);
}

#[tokio::test]
async fn test_homepage_failure_falls_back_to_requested_pages() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    mount_page(&server, "/about", "<p>About Acme</p>").await;

    let pages = names(&["about"]);
    let result = crawler(&fast_config(dir.path()))
        .crawl(&server.uri(), Some(pages.as_slice()), 10)
        .await;

    assert!(result.page_contents.contains_key("/about"));
    assert!(!result.page_contents.contains_key("homepage"));
    assert!(!result.is_total_failure());
    assert_eq!(result.homepage_internal_links, 0);

    let error = result.error.unwrap();
    assert!(error.starts_with("homepage ("), "{}", error);
    assert!(error.contains("500"));
}

#[tokio::test]
async fn test_homepage_failure_without_pages_is_total() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = crawler(&fast_config(dir.path()))
        .crawl(&server.uri(), None, 10)
        .await;

    assert!(result.is_total_failure());
    assert!(result.page_contents.is_empty());
}

#[tokio::test]
async fn test_rate_limited_page_is_retried() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "/", "<p>Welcome back</p>").await;

    let result = crawler(&fast_config(dir.path()))
        .crawl(&server.uri(), None, 10)
        .await;

    assert!(result.error.is_none(), "{:?}", result.error);
    assert!(result.page_contents["homepage"].contains("Welcome back"));
    assert_eq!(requests_to(&server, "/").await, 2);
}

#[tokio::test]
async fn test_benchmark_end_to_end_with_custom_html() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        r#"<h1>Acme</h1><p>B2B SaaS for everyone.</p><a href="/about">About</a>"#,
    )
    .await;
    mount_page(&server, "/about", "<p>Written in English.</p>").await;

    let mut extractors = ExtractorRegistry::empty();
    let calls = ScriptedExtractor::register(&mut extractors, "openai", ScriptedExtractor::accurate());
    let scorer = GroundTruthScorer::from_jsonl(&ground_truth_for(&server.uri())).unwrap();
    let uri = server.uri();
    let bench = BenchmarkPipeline::new(fast_config(dir.path()), Arc::new(scorer))
        .unwrap()
        .with_extractors(extractors)
        .with_config_hash("cafebabe".to_string());

    let report = bench
        .run(
            &names(&[uri.as_str()]),
            &names(&["custom_html"]),
            &names(&["openai"]),
            &RunOptions::default(),
        )
        .await;

    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(report.total_combinations, 1);
    assert_eq!(report.config_hash.as_deref(), Some("cafebabe"));
    let result = &report.results[0];
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(result.crawler, "custom_html");
    assert_eq!(result.homepage_internal_links, 1);
    assert_eq!(result.homepage_internal_links_crawled, 1);
    assert!(result.overall_accuracy > 0.0);

    let store = FsArtifactStore::new(dir.path());
    assert!(store.artifact_path(&uri, "custom_html", "openai").exists());

    let written = save_results(&report, dir.path(), ReportFormat::All).unwrap();
    assert_eq!(written.len(), 3);
    let json = std::fs::read_to_string(&written[0]).unwrap();
    assert!(json.contains("\"config_hash\": \"cafebabe\""));
}
