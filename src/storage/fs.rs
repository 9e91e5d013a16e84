//! Filesystem object store.

use super::{validate_key, ObjectStore, StorageError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes objects under a root directory, one file per key.
///
/// Files are written to a `.part` sibling and renamed into place so readers
/// never see a partial image.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Local path of a stored key.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn upload(&self, bytes: Vec<u8>, key: &str) -> Result<String, StorageError> {
        validate_key(key)?;
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut partial = path.clone().into_os_string();
        partial.push(".part");
        let partial = PathBuf::from(partial);

        tokio::fs::write(&partial, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&partial, &path).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e.into());
        }

        debug!(key, bytes = bytes.len(), path = %path.display(), "Stored object");
        Ok(key.to_string())
    }
}
