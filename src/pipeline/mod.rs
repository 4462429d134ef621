//! The benchmark pipeline
//!
//! # Components
//!
//! - `BenchmarkPipeline`: runs every domain × backend × extractor combination
//! - `RunOptions`: cache, page and comparison switches for one run
//! - `compute_summary` / `build_report`: per-group mean accuracies
//! - domain list loading for the CLI

mod domains;
mod runner;
mod summary;

pub use domains::{load_domains_csv, normalize_domain_arg, read_domains_csv};
pub use runner::{BenchmarkPipeline, RunOptions};
pub use summary::{build_report, compute_summary, Summaries};
