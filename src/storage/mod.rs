//! Storage module for persisting fetched files
//!
//! This module handles everything on the local side of a crawl:
//! - The `FileSink` interface leaf bodies are streamed into
//! - A filesystem implementation rooted at the configured output directory

mod fs;
mod traits;

pub use fs::FsStorage;
pub use traits::{FileSink, StorageError, StorageResult};

use std::path::Path;
use std::sync::Arc;

/// Opens the filesystem sink for an output directory
///
/// The directory itself is created lazily, with the first stored file.
pub fn open_storage(path: &Path) -> Arc<dyn FileSink> {
    Arc::new(FsStorage::new(path))
}
