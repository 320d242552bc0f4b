//! Filesystem helpers for inspecting tool output.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::MediaResult;

/// Size of a file in bytes.
pub async fn file_size(path: impl AsRef<Path>) -> MediaResult<u64> {
    Ok(fs::metadata(path.as_ref()).await?.len())
}

/// Regular files in `dir` whose extension is `ext`, sorted by name.
pub async fn files_with_extension(dir: impl AsRef<Path>, ext: &str) -> MediaResult<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir.as_ref()).await?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == ext);
        if matches && entry.file_type().await?.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Sum of the sizes of `paths`.
pub async fn total_size(paths: &[PathBuf]) -> MediaResult<u64> {
    let mut total = 0;
    for path in paths {
        total += file_size(path).await?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_files_with_extension() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("master1.ts"), b"bb").await.unwrap();
        fs::write(dir.path().join("master0.ts"), b"a").await.unwrap();
        fs::write(dir.path().join("master.m3u8"), b"#EXTM3U").await.unwrap();
        fs::create_dir(dir.path().join("nested.ts")).await.unwrap();

        let files = files_with_extension(dir.path(), "ts").await.unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["master0.ts", "master1.ts"]);
        assert_eq!(total_size(&files).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_file_size_missing() {
        assert!(file_size("/nonexistent/file").await.is_err());
    }
}
