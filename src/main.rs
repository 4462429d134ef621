//! Scrape-Bench main entry point
//!
//! This is the command-line interface for the crawl-and-extract benchmark.

use anyhow::{bail, Context};
use clap::Parser;
use scrape_bench::backends::BackendKind;
use scrape_bench::config::{load_env_file, mask_key, resolve_config, validate, validate_api_keys, Config, API_KEY_VARS};
use scrape_bench::extractor::ExtractorKind;
use scrape_bench::output::{print_summary, save_results, ReportFormat};
use scrape_bench::pipeline::{load_domains_csv, normalize_domain_arg};
use scrape_bench::{BenchmarkPipeline, RunOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// Scrape-Bench: crawler × LLM extraction benchmark
///
/// Crawls each domain with every selected backend, extracts company
/// features with every selected LLM, scores them against ground truth and
/// caches every intermediate artifact so re-runs skip paid calls.
#[derive(Parser, Debug)]
#[command(name = "scrape-bench")]
#[command(version)]
#[command(about = "Benchmark crawler backends and LLM extractors", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults plus environment if omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// CSV file with a `domain` (or `url`) column
    #[arg(long, value_name = "FILE", conflicts_with = "domain_list", required_unless_present = "domain_list")]
    domains: Option<PathBuf>,

    /// Space-separated domains
    #[arg(long, num_args = 1.., value_name = "DOMAIN")]
    domain_list: Vec<String>,

    /// Crawler backends to benchmark
    #[arg(
        long,
        num_args = 1..,
        value_parser = BackendKind::from_str,
        default_values = ["firecrawl", "crawl4ai", "jina", "scrapingbee", "scraperapi", "custom_html"]
    )]
    crawlers: Vec<BackendKind>,

    /// LLM extractors to benchmark
    #[arg(
        long,
        visible_alias = "llms",
        num_args = 1..,
        value_parser = ExtractorKind::from_str,
        default_values = ["openai", "claude"]
    )]
    extractors: Vec<ExtractorKind>,

    /// Max internal pages to crawl per domain, excluding the homepage
    #[arg(long)]
    max_pages: Option<usize>,

    /// Only crawl these pages (paths or absolute URLs) besides the homepage
    #[arg(long, num_args = 1.., value_name = "PAGE")]
    pages: Option<Vec<String>>,

    /// Directory for reports and the artifact cache
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Report formats to write: json, csv or all
    #[arg(long, default_value = "json", value_parser = ReportFormat::from_str)]
    output_format: ReportFormat,

    /// Ignore cached artifacts and run every stage live
    #[arg(long, conflicts_with = "cache_only")]
    no_cache: bool,

    /// Never crawl; use cached crawl and parse artifacts only
    #[arg(long)]
    cache_only: bool,

    /// Do not persist per-combination artifacts
    #[arg(long)]
    dont_save_intermediate: bool,

    /// Re-score cached extractions with an LLM value comparison (implies --cache-only)
    #[arg(long, conflicts_with = "no_cache")]
    llm_compare: bool,

    /// Env file with API keys (default: ./.env if present)
    #[arg(long, value_name = "FILE")]
    env_file: Option<PathBuf>,

    /// Validate configuration and show the planned run without executing it
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn run_options(&self, config: &Config) -> RunOptions {
        RunOptions {
            pages: self.pages.clone(),
            max_pages: self.max_pages.unwrap_or(config.crawler.max_pages),
            use_cache: !self.no_cache,
            cache_only: self.cache_only,
            save_intermediate: !self.dont_save_intermediate,
            llm_compare: self.llm_compare,
        }
    }

    fn crawler_names(&self) -> Vec<String> {
        self.crawlers.iter().map(|k| k.as_str().to_string()).collect()
    }

    fn extractor_names(&self) -> Vec<String> {
        self.extractors.iter().map(|k| k.as_str().to_string()).collect()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    load_env_file(cli.env_file.as_deref())?;

    if let Some(path) = &cli.config {
        tracing::info!("Loading configuration from: {}", path.display());
    }
    let (mut config, config_hash) =
        resolve_config(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(hash) = &config_hash {
        tracing::info!("Configuration loaded successfully (hash: {})", hash);
    }

    if let Some(dir) = &cli.output_dir {
        config.output.output_dir = dir.display().to_string();
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    validate(&config)?;

    log_api_keys(&config);

    let crawlers = cli.crawler_names();
    let extractors = cli.extractor_names();
    check_api_keys(&cli, &config, &crawlers, &extractors)?;

    let domains = load_domains(&cli)?;
    if domains.is_empty() {
        bail!("No domains to benchmark");
    }

    let options = cli.run_options(&config);
    if cli.dry_run {
        handle_dry_run(&config, &domains, &crawlers, &extractors, &options);
        return Ok(());
    }

    handle_run(cli.output_format, config, config_hash, &domains, &crawlers, &extractors, &options).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("scrape_bench=info,warn"),
            1 => EnvFilter::new("scrape_bench=debug,info"),
            2 => EnvFilter::new("scrape_bench=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn log_api_keys(config: &Config) {
    let masked: Vec<String> = API_KEY_VARS
        .iter()
        .map(|(_, provider)| format!("{}={}", provider, mask_key(config.api_keys.get(provider))))
        .collect();
    tracing::info!("API keys: {}", masked.join(", "));
}

/// Only tools that will actually be called need credentials
fn check_api_keys(
    cli: &Cli,
    config: &Config,
    crawlers: &[String],
    extractors: &[String],
) -> anyhow::Result<()> {
    let live_crawlers: &[String] = if cli.cache_only || cli.llm_compare { &[] } else { crawlers };
    let live_extractors: &[String] = if cli.llm_compare { &[] } else { extractors };

    if let Err(e) = validate_api_keys(&config.api_keys, live_crawlers, live_extractors) {
        eprintln!("\nConfiguration error:\n{}\n", e);
        eprintln!("Set the missing keys in the environment or an env file (--env-file).");
        return Err(e.into());
    }
    Ok(())
}

fn load_domains(cli: &Cli) -> anyhow::Result<Vec<String>> {
    match &cli.domains {
        Some(path) => load_domains_csv(path)
            .with_context(|| format!("Failed to read domains from {}", path.display())),
        None => Ok(cli
            .domain_list
            .iter()
            .filter_map(|d| normalize_domain_arg(d))
            .collect()),
    }
}

/// Handles the --dry-run mode: shows what would be run
fn handle_dry_run(
    config: &Config,
    domains: &[String],
    crawlers: &[String],
    extractors: &[String],
    options: &RunOptions,
) {
    println!("=== Scrape-Bench Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Timeout: {}s", config.crawler.timeout_secs);
    println!("  Max retries: {}", config.crawler.max_retries);
    println!("  Min delay: {}ms", config.crawler.min_delay_ms);
    println!("  Max pages: {}", options.max_pages);
    if let Some(pages) = &options.pages {
        println!("  Pages: {}", pages.join(", "));
    }

    println!("\nAPI Keys:");
    for (variable, provider) in API_KEY_VARS {
        println!("  {}: {}", variable, mask_key(config.api_keys.get(provider)));
    }

    println!("\nOutput:");
    println!("  Directory: {}", config.output.output_dir);
    println!("  Ground truth: {}", config.output.ground_truth_path);
    println!(
        "  Cache: {}",
        if options.llm_compare || options.cache_only {
            "cache only"
        } else if options.use_cache {
            "reuse"
        } else {
            "ignore"
        }
    );
    println!("  Save intermediate: {}", options.save_intermediate);
    println!("  LLM compare: {}", options.llm_compare);

    println!("\nCrawlers ({}): {}", crawlers.len(), crawlers.join(", "));
    println!("Extractors ({}): {}", extractors.len(), extractors.join(", "));
    println!("\nDomains ({}):", domains.len());
    for domain in domains {
        println!("  - {}", domain);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would run {} combinations",
        domains.len() * crawlers.len() * extractors.len()
    );
}

/// Handles the benchmark run: execute, save and print
async fn handle_run(
    format: ReportFormat,
    config: Config,
    config_hash: Option<String>,
    domains: &[String],
    crawlers: &[String],
    extractors: &[String],
    options: &RunOptions,
) -> anyhow::Result<()> {
    tracing::info!(
        "Benchmark: {} domains × {} crawlers × {} LLMs",
        domains.len(),
        crawlers.len(),
        extractors.len()
    );
    tracing::info!("  Crawlers: {}", crawlers.join(", "));
    tracing::info!("  LLMs: {}", extractors.join(", "));
    tracing::info!("  Max pages: {}", options.max_pages);

    let output_dir = PathBuf::from(&config.output.output_dir);
    let mut pipeline = BenchmarkPipeline::from_config(config).context("Failed to set up pipeline")?;
    if let Some(hash) = config_hash {
        pipeline = pipeline.with_config_hash(hash);
    }

    let report = pipeline.run(domains, crawlers, extractors, options).await;

    let written = save_results(&report, Path::new(&output_dir), format)?;
    for path in &written {
        tracing::info!("Wrote {}", path.display());
    }
    print_summary(&report);

    Ok(())
}
