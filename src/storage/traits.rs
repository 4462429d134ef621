//! Storage traits and error types
//!
//! This module defines the trait interface for artifact stores and
//! associated error types.

use crate::types::{CrawlResult, ExtractedFeatures, FeatureSimilarity, ParsedContent};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt artifact {}: {message}", path.display())]
    Corrupt { path: PathBuf, message: String },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Everything one (domain, backend, extractor) run produced
///
/// The crawl and parsed content are shared by every extractor of the same
/// backend, so any artifact for a backend can stand in for a fresh crawl.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub crawl: CrawlResult,
    pub parsed: ParsedContent,
    pub extraction: ExtractedFeatures,
}

/// Trait for artifact store implementations
///
/// Lookups never fail: a missing or unreadable artifact is a cache miss.
/// Implementations must be shareable across tasks.
pub trait ArtifactStore: Send + Sync {
    /// Gets the artifact for an exact (domain, backend, extractor) triple
    fn get(&self, domain: &str, backend: &str, extractor: &str) -> Option<Artifact>;

    /// Gets any artifact stored for (domain, backend)
    ///
    /// Implementations pick deterministically, so repeated runs reuse the
    /// same crawl.
    fn find_any(&self, domain: &str, backend: &str) -> Option<Artifact>;

    /// Stores an artifact, replacing any previous one for the same triple
    fn put(&self, artifact: &Artifact) -> StorageResult<()>;

    /// Gets stored comparison scores for a triple
    fn get_comparison(&self, domain: &str, backend: &str, extractor: &str) -> Option<Vec<FeatureSimilarity>>;

    /// Stores comparison scores beside the artifact they judge
    fn put_comparison(
        &self,
        domain: &str,
        backend: &str,
        extractor: &str,
        scores: &[FeatureSimilarity],
    ) -> StorageResult<()>;
}
