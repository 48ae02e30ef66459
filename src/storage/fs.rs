use crate::crawler::BodyStream;
use crate::storage::traits::{FileSink, StorageError, StorageResult};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Writes fetched files under a local output directory
///
/// A file fetched at `year_2014/month_01/day_01/gid_1/boxscore.xml` lands at
/// `<root>/year_2014/month_01/day_01/gid_1/boxscore.xml`; missing parent
/// directories are created on demand.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a relative crawl path to its destination on disk
    pub fn destination(&self, path: &str) -> StorageResult<PathBuf> {
        let relative = Path::new(path);
        let valid = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if path.is_empty() || !valid {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileSink for FsStorage {
    async fn store(&self, path: &str, body: &mut BodyStream) -> StorageResult<u64> {
        let target = self.destination(path)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StorageError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let write_err = |source| StorageError::Write {
            path: target.clone(),
            source,
        };

        let mut file = tokio::fs::File::create(&target).await.map_err(write_err)?;
        let mut written = 0u64;

        while let Some(chunk) = body.chunk().await? {
            file.write_all(&chunk).await.map_err(write_err)?;
            written += chunk.len() as u64;
        }

        file.flush().await.map_err(write_err)?;
        tracing::debug!("Stored {} ({} bytes)", target.display(), written);

        Ok(written)
    }
}
