//! The artifact store abstraction shared by all backends.

use async_trait::async_trait;
use std::path::Path;

use crate::error::{StorageError, StorageResult};

/// Object-path get/put of binary files.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Download `key` to `local_path`, creating parent directories.
    ///
    /// Returns [`StorageError::NotFound`] when the object does not exist.
    /// No partial file is left behind on failure.
    async fn download(&self, key: &str, local_path: &Path) -> StorageResult<()>;

    /// Upload `local_path` to `key` and return the object's public URL.
    async fn upload(&self, local_path: &Path, key: &str) -> StorageResult<String>;
}

/// Content type for a published artifact, by extension.
pub fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("m3u8") => "application/vnd.apple.mpegurl",
        Some("ts") => "video/mp2t",
        Some("mp4") => "video/mp4",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

/// Reject keys that would escape a bucket or root directory.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty()
        || key.starts_with('/')
        || key.split('/').any(|segment| segment == "..")
    {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// `{base}/{bucket}/{key}` without doubled slashes.
pub fn public_url(base: &str, bucket: &str, key: &str) -> String {
    format!("{}/{}/{}", base.trim_end_matches('/'), bucket, key)
}
