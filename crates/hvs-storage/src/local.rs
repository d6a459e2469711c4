//! Directory-backed artifact store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{StorageError, StorageResult};
use crate::store::ArtifactStore;

/// Stores artifacts as flat files in one directory.
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

/// Keys are plain file names.
fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key == "." || key == ".." || key.contains('/') || key.contains('\\') {
        return Err(StorageError::invalid_key(key));
    }
    Ok(())
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn init(&self) -> StorageResult<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        debug!(root = %self.root.display(), "Artifact directory ready");
        Ok(())
    }

    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<String> {
        let path = self.path_for(key)?;
        debug!("Writing {} bytes ({}) to {}", data.len(), content_type, path.display());

        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| StorageError::write_failed(format!("{}: {}", path.display(), e)))?;

        Ok(path.to_string_lossy().to_string())
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::not_found(key)),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.path_for(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn delete_all(&self) -> StorageResult<usize> {
        clear_directory(&self.root).await
    }
}

/// Delete every regular file directly inside `dir`.
///
/// Returns how many files were removed. A missing directory counts as empty;
/// files that fail to delete are logged and skipped.
pub async fn clear_directory(dir: &Path) -> StorageResult<usize> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut deleted = 0;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_file = match entry.file_type().await {
            Ok(ft) => ft.is_file(),
            Err(_) => false,
        };
        if !is_file {
            continue;
        }
        match tokio::fs::remove_file(&path).await {
            Ok(()) => deleted += 1,
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to delete file"),
        }
    }

    info!(dir = %dir.display(), deleted, "Directory cleared");
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_and_reference() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path().join("violations_frames"));
        store.init().await.unwrap();

        let reference = store
            .put("viol_track7_f50.jpg", vec![0xFF, 0xD8, 0x01], "image/jpeg")
            .await
            .unwrap();

        assert!(reference.ends_with("violations_frames/viol_track7_f50.jpg"));
        assert!(store.exists("viol_track7_f50.jpg").await.unwrap());
        assert_eq!(store.get("viol_track7_f50.jpg").await.unwrap(), vec![0xFF, 0xD8, 0x01]);
    }

    #[tokio::test]
    async fn test_rejects_nested_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path());

        let err = store.put("../escape.jpg", vec![1], "image/jpeg").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path());
        assert!(matches!(store.get("nope.jpg").await, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_all_counts_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path());
        store.put("a.jpg", vec![1], "image/jpeg").await.unwrap();
        store.put("b.jpg", vec![2], "image/jpeg").await.unwrap();
        tokio::fs::create_dir(dir.path().join("sub")).await.unwrap();

        assert_eq!(store.delete_all().await.unwrap(), 2);
        assert!(!store.exists("a.jpg").await.unwrap());
        assert!(dir.path().join("sub").exists());
    }

    #[tokio::test]
    async fn test_clear_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(clear_directory(&dir.path().join("missing")).await.unwrap(), 0);
    }
}
