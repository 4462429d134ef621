//! Filesystem artifact store
//!
//! Layout under the output directory:
//!
//! ```text
//! intermediate/{domain_key}/{backend}/{extractor}.json
//! intermediate/{domain_key}/{backend}/{extractor}_llm_compare.json
//! ```

use crate::storage::traits::{Artifact, ArtifactStore, StorageError, StorageResult};
use crate::types::{ComparisonRecord, FeatureSimilarity};
use crate::url::domain_key;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the cache directory inside the output directory
pub const INTERMEDIATE_DIR: &str = "intermediate";

const COMPARISON_SUFFIX: &str = "_llm_compare.json";

/// JSON files on disk, one per (domain, backend, extractor)
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Creates a store rooted at `{output_dir}/intermediate`
    ///
    /// Nothing is created on disk until the first write.
    pub fn new(output_dir: &Path) -> Self {
        Self {
            root: output_dir.join(INTERMEDIATE_DIR),
        }
    }

    fn backend_dir(&self, domain: &str, backend: &str) -> PathBuf {
        self.root.join(domain_key(domain)).join(backend)
    }

    /// Path of the artifact for a triple
    pub fn artifact_path(&self, domain: &str, backend: &str, extractor: &str) -> PathBuf {
        self.backend_dir(domain, backend).join(format!("{}.json", extractor))
    }

    /// Path of the comparison record for a triple
    pub fn comparison_path(&self, domain: &str, backend: &str, extractor: &str) -> PathBuf {
        self.backend_dir(domain, backend)
            .join(format!("{}{}", extractor, COMPARISON_SUFFIX))
    }
}

/// Reads a JSON file; absence is `Ok(None)`, bad content is `Corrupt`
fn read_json<T: DeserializeOwned>(path: &Path) -> StorageResult<Option<T>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| StorageError::Corrupt {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Turns read failures into misses, warning about them
fn read_or_miss<T: DeserializeOwned>(path: &Path) -> Option<T> {
    match read_json(path) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Ignoring cached artifact: {}", e);
            None
        }
    }
}

/// Writes pretty JSON through a temporary sibling and a rename
///
/// Readers see either the old file or the complete new one.
fn write_json<T: Serialize>(path: &Path, value: &T) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl ArtifactStore for FsArtifactStore {
    fn get(&self, domain: &str, backend: &str, extractor: &str) -> Option<Artifact> {
        read_or_miss(&self.artifact_path(domain, backend, extractor))
    }

    fn find_any(&self, domain: &str, backend: &str) -> Option<Artifact> {
        let entries = fs::read_dir(self.backend_dir(domain, backend)).ok()?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
                name.ends_with(".json") && !name.ends_with(COMPARISON_SUFFIX)
            })
            .collect();
        paths.sort();

        paths.iter().find_map(|path| read_or_miss(path))
    }

    fn put(&self, artifact: &Artifact) -> StorageResult<()> {
        let path = self.artifact_path(
            &artifact.crawl.domain,
            &artifact.crawl.crawler,
            &artifact.extraction.llm,
        );
        write_json(&path, artifact)?;
        tracing::debug!(path = %path.display(), "Saved artifact");
        Ok(())
    }

    fn get_comparison(&self, domain: &str, backend: &str, extractor: &str) -> Option<Vec<FeatureSimilarity>> {
        read_or_miss::<ComparisonRecord>(&self.comparison_path(domain, backend, extractor))
            .map(|record| record.openai)
    }

    fn put_comparison(
        &self,
        domain: &str,
        backend: &str,
        extractor: &str,
        scores: &[FeatureSimilarity],
    ) -> StorageResult<()> {
        let record = ComparisonRecord {
            domain: domain.to_string(),
            crawler: backend.to_string(),
            llm: extractor.to_string(),
            openai: scores.to_vec(),
        };
        write_json(&self.comparison_path(domain, backend, extractor), &record)
    }
}
