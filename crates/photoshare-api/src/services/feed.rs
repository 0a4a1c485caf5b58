//! Feed service
//!
//! The facade the HTTP handlers talk to. It resolves the acting user against the identity
//! store, resolves page requests against the configured limits, and delegates to the catalog,
//! the ledger and the blob store. It holds no state of its own.

use std::sync::Arc;

use bytes::Bytes;
use photoshare_core::models::{Comment, LikeResult, Media, NewMedia, Page, PageRequest};
use photoshare_core::validation::sanitize_filename;
use photoshare_core::{AppError, Config, FeedConfig};
use photoshare_db::Repositories;
use photoshare_storage::BlobStore;

use crate::error::storage_error;

/// A file received from a client, before it is stored.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

#[derive(Clone)]
pub struct FeedService {
    repos: Repositories,
    blobs: Arc<dyn BlobStore>,
    feed: FeedConfig,
    max_file_size_bytes: usize,
}

impl FeedService {
    pub fn new(repos: Repositories, blobs: Arc<dyn BlobStore>, config: &Config) -> Self {
        Self {
            repos,
            blobs,
            feed: config.feed.clone(),
            max_file_size_bytes: config.max_file_size_bytes,
        }
    }

    fn page(&self, after: Option<i64>, limit: Option<i64>) -> Result<PageRequest, AppError> {
        PageRequest::resolve(after, limit, &self.feed)
    }

    /// Store the bytes, then record the media. A failed insert removes the stored blob.
    #[tracing::instrument(skip(self, upload), fields(
        file_name = %upload.file_name,
        file_size = upload.data.len(),
        operation = "upload_media"
    ))]
    pub async fn upload_media(&self, user_id: i64, upload: MediaUpload) -> Result<Media, AppError> {
        self.repos.identity.ensure_user(user_id).await?;

        if upload.data.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }
        if upload.data.len() > self.max_file_size_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "File size exceeds maximum allowed size of {} MB",
                self.max_file_size_bytes / 1024 / 1024
            )));
        }

        let file_name = sanitize_filename(&upload.file_name)?;
        let file_size = upload.data.len() as i64;

        let (download_handle, download_url) = self
            .blobs
            .upload(user_id, &file_name, &upload.content_type, upload.data)
            .await
            .map_err(storage_error)?;

        let new_media = NewMedia {
            creator_id: user_id,
            file_name,
            file_size,
            content_type: upload.content_type,
            download_handle: download_handle.clone(),
            download_url,
        };

        match self.repos.catalog.create_media(new_media).await {
            Ok(media) => {
                tracing::info!(media_id = media.id, "Media uploaded");
                Ok(media)
            }
            Err(err) => {
                if let Err(cleanup) = self.blobs.delete(&download_handle).await {
                    tracing::warn!(
                        error = %cleanup,
                        storage_key = %download_handle,
                        "Failed to remove orphaned blob after catalog insert failed"
                    );
                }
                Err(err)
            }
        }
    }

    /// Media record plus its stored bytes.
    pub async fn download_media(
        &self,
        user_id: i64,
        media_id: i64,
    ) -> Result<(Media, Bytes), AppError> {
        self.repos.identity.ensure_user(user_id).await?;
        let media = self.repos.catalog.get_media(media_id).await?;

        tracing::debug!(
            media_id = media_id,
            storage_key = %media.download_handle,
            "Fetching media bytes from blob store"
        );
        let data = self
            .blobs
            .download(&media.download_handle)
            .await
            .map_err(storage_error)?;
        Ok((media, data))
    }

    /// Bytes behind a public download URL.
    pub async fn fetch_blob(&self, storage_key: &str) -> Result<Bytes, AppError> {
        self.blobs.download(storage_key).await.map_err(storage_error)
    }

    pub async fn feed(
        &self,
        user_id: i64,
        after: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Page<Media>, AppError> {
        let page = self.page(after, limit)?;
        self.repos.identity.ensure_user(user_id).await?;
        self.repos.catalog.list_feed(user_id, page).await
    }

    pub async fn like(&self, user_id: i64, media_id: i64) -> Result<LikeResult, AppError> {
        self.repos.identity.ensure_user(user_id).await?;
        self.repos.ledger.like(user_id, media_id).await
    }

    pub async fn dislike(&self, user_id: i64, media_id: i64) -> Result<LikeResult, AppError> {
        self.repos.identity.ensure_user(user_id).await?;
        self.repos.ledger.dislike(user_id, media_id).await
    }

    pub async fn comments(
        &self,
        user_id: i64,
        media_id: i64,
        after: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Page<Comment>, AppError> {
        let page = self.page(after, limit)?;
        self.repos.identity.ensure_user(user_id).await?;
        self.repos.ledger.list_comments(media_id, page).await
    }

    pub async fn comment(
        &self,
        user_id: i64,
        media_id: i64,
        text: &str,
    ) -> Result<Comment, AppError> {
        self.repos.identity.ensure_user(user_id).await?;
        self.repos.ledger.comment(user_id, media_id, text).await
    }

    pub async fn uncomment(
        &self,
        user_id: i64,
        media_id: i64,
        comment_id: i64,
    ) -> Result<(), AppError> {
        self.repos.identity.ensure_user(user_id).await?;
        self.repos.ledger.uncomment(user_id, media_id, comment_id).await
    }

    pub async fn liked_by(&self, user_id: i64) -> Result<Vec<Media>, AppError> {
        self.repos.identity.ensure_user(user_id).await?;
        self.repos.ledger.list_media_liked_by(user_id).await
    }

    pub async fn commented_by(&self, user_id: i64) -> Result<Vec<Media>, AppError> {
        self.repos.identity.ensure_user(user_id).await?;
        self.repos.ledger.list_media_commented_by(user_id).await
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.repos.catalog.health_check().await
    }
}
