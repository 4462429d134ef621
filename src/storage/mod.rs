//! Storage module for cached pipeline artifacts
//!
//! Every live extraction can be persisted together with the crawl and parsed
//! content it came from. Later runs read these artifacts back instead of
//! repeating crawls and paid model calls.

mod fs;
mod traits;

pub use fs::{FsArtifactStore, INTERMEDIATE_DIR};
pub use traits::{Artifact, ArtifactStore, StorageError, StorageResult};

use std::path::Path;
use std::sync::Arc;

/// Opens the artifact store for an output directory
pub fn open_store(output_dir: &Path) -> Arc<dyn ArtifactStore> {
    Arc::new(FsArtifactStore::new(output_dir))
}
