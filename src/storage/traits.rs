//! Storage traits and error types
//!
//! This module defines the interface a crawl uses to persist leaf files and
//! the errors a storage backend can report.

use crate::crawler::BodyStream;
use crate::TransportError;
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while persisting a fetched file
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("refusing to write outside the output directory: {0}")]
    InvalidPath(String),

    #[error(transparent)]
    Body(#[from] TransportError),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Destination for leaf file bodies
///
/// Registering a sink with the crawler is what makes it persist files;
/// without one, leaf bodies are read and discarded.
///
/// Implementations receive the body as a stream and should consume it
/// chunk by chunk rather than buffering it. Whatever is left unread when
/// `store` returns is drained by the crawler before the item completes.
#[async_trait]
pub trait FileSink: Send + Sync {
    /// Persists the body of the file at relative `path`
    ///
    /// # Returns
    ///
    /// The number of bytes written
    async fn store(&self, path: &str, body: &mut BodyStream) -> StorageResult<u64>;
}
