//! Artifact store interface.

use async_trait::async_trait;

use crate::error::StorageResult;

/// Durable storage for evidence images, addressed by key.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Prepare the backing location.
    async fn init(&self) -> StorageResult<()>;

    /// Store `data` under `key` and return the stored reference.
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<String>;

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>>;

    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Remove every stored artifact, returning how many were removed.
    async fn delete_all(&self) -> StorageResult<usize>;
}
