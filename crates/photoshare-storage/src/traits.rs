//! Blob store abstraction trait

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Blob store trait
///
/// Every backend persists raw uploaded bytes and hands back a key (the download handle
/// kept on the media record) plus a URL for clients.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes for `creator_id` and return `(storage_key, storage_url)`
    async fn upload(
        &self,
        creator_id: i64,
        filename: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<(String, String)>;

    /// Fetch the bytes stored under `storage_key`
    async fn download(&self, storage_key: &str) -> StorageResult<Bytes>;

    /// Delete by key; deleting a missing key succeeds
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
