//! Local filesystem artifact store.
//!
//! Objects live under `{root}/{bucket}/{key}`. Used for development and for
//! driving the worker without an object store.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{StorageError, StorageResult};
use crate::store::{public_url, validate_key, ArtifactStore};

#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
    bucket: String,
    public_base_url: String,
}

impl LocalStore {
    pub fn new(
        root: impl Into<PathBuf>,
        bucket: impl Into<String>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            bucket: bucket.into(),
            public_base_url: public_base_url.into(),
        }
    }

    /// `LOCAL_STORAGE_ROOT` (default `./storage`), `S3_BUCKET_NAME`
    /// (default `media`) and `S3_PUBLIC_BASE_URL` (default `file://{root}`).
    pub fn from_env() -> Self {
        let root =
            std::env::var("LOCAL_STORAGE_ROOT").unwrap_or_else(|_| "./storage".to_string());
        let bucket = std::env::var("S3_BUCKET_NAME").unwrap_or_else(|_| "media".to_string());
        let base = std::env::var("S3_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("file://{}", root.trim_end_matches('/')));
        Self::new(root, bucket, base)
    }

    /// Filesystem path backing `key`.
    pub fn object_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(&self.bucket).join(key))
    }
}

#[async_trait]
impl ArtifactStore for LocalStore {
    async fn download(&self, key: &str, local_path: &Path) -> StorageResult<()> {
        let src = self.object_path(key)?;
        if !tokio::fs::try_exists(&src).await? {
            return Err(StorageError::not_found(key));
        }

        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        if let Err(e) = tokio::fs::copy(&src, local_path).await {
            if let Err(rm) = tokio::fs::remove_file(local_path).await {
                if rm.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove partial copy {}: {}", local_path.display(), rm);
                }
            }
            return Err(StorageError::download_failed(format!("{}: {}", key, e)));
        }

        debug!("Copied {} to {}", src.display(), local_path.display());
        Ok(())
    }

    async fn upload(&self, local_path: &Path, key: &str) -> StorageResult<String> {
        let dest = self.object_path(key)?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::copy(local_path, &dest)
            .await
            .map_err(|e| StorageError::upload_failed(format!("{}: {}", local_path.display(), e)))?;

        debug!("Stored {} at {}", local_path.display(), dest.display());
        Ok(public_url(&self.public_base_url, &self.bucket, key))
    }
}
