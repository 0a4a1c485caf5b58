//! Blob store setup

use std::sync::Arc;

use anyhow::{Context, Result};
use photoshare_core::Config;
use photoshare_storage::{create_blob_store, BlobStore};

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn BlobStore>> {
    let storage = create_blob_store(config)
        .await
        .context("Failed to initialize blob store")?;

    tracing::info!(
        backend = %storage.backend_type(),
        base_url = %config.local_storage_base_url,
        "Blob store initialized"
    );
    Ok(storage)
}
