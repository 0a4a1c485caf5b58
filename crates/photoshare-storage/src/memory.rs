use crate::keys::{generate_storage_key, is_safe_key};
use crate::traits::{BlobStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-process blob store; contents are lost on restart.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    blobs: Arc<RwLock<HashMap<String, Bytes>>>,
    base_url: String,
}

impl MemoryStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            blobs: Arc::default(),
            base_url: base_url.into(),
        }
    }

    /// Number of stored blobs
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }

    fn check_key(storage_key: &str) -> StorageResult<()> {
        if is_safe_key(storage_key) {
            Ok(())
        } else {
            Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ))
        }
    }
}

#[async_trait]
impl BlobStore for MemoryStorage {
    async fn upload(
        &self,
        creator_id: i64,
        filename: &str,
        _content_type: &str,
        data: Bytes,
    ) -> StorageResult<(String, String)> {
        let key = generate_storage_key(creator_id, filename);
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), key);
        self.blobs.write().await.insert(key.clone(), data);
        Ok((key, url))
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Bytes> {
        Self::check_key(storage_key)?;
        self.blobs
            .read()
            .await
            .get(storage_key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        Self::check_key(storage_key)?;
        self.blobs.write().await.remove(storage_key);
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_and_deletes() {
        let storage = MemoryStorage::new("memory://blobs");
        let (key, url) = storage
            .upload(2, "b.jpg", "image/jpeg", Bytes::from_static(b"jpeg"))
            .await
            .unwrap();
        assert!(url.starts_with("memory://blobs/media/2/"));
        assert_eq!(storage.download(&key).await.unwrap(), Bytes::from_static(b"jpeg"));

        storage.delete(&key).await.unwrap();
        assert!(matches!(
            storage.download(&key).await,
            Err(StorageError::NotFound(_))
        ));
    }
}
