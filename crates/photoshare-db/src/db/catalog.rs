//! Media catalog: media records and the global feed

use async_trait::async_trait;
use photoshare_core::models::{Media, NewMedia, Page, PageRequest};
use photoshare_core::AppError;
use sqlx::PgPool;

pub(crate) const MEDIA_COLUMNS: &str = "m.id, m.creator_id, m.file_name, m.file_size, \
     m.content_type, m.download_handle, m.download_url, m.created_at, m.likes_count, \
     m.comments_count";

/// Advisory lock key held while a media row is inserted. Ids and `created_at` are assigned
/// under it, so `created_at` never decreases as ids grow.
const MEDIA_INSERT_LOCK: i64 = 0x6d65_6469_61;

#[async_trait]
pub trait MediaCatalog: Send + Sync {
    /// Persist a new media item with zeroed counters. `NotFound` if the creator is unknown.
    async fn create_media(&self, new_media: NewMedia) -> Result<Media, AppError>;

    async fn get_media(&self, media_id: i64) -> Result<Media, AppError>;

    /// Newest-first page of media visible to `viewer_id`. Every item is visible to every user.
    async fn list_feed(&self, viewer_id: i64, page: PageRequest)
        -> Result<Page<Media>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct PgMediaCatalog {
    pool: PgPool,
}

impl PgMediaCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MediaCatalog for PgMediaCatalog {
    #[tracing::instrument(skip(self, new_media), fields(
        db.table = "media",
        db.operation = "insert",
        creator_id = new_media.creator_id
    ))]
    async fn create_media(&self, new_media: NewMedia) -> Result<Media, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(MEDIA_INSERT_LOCK)
            .execute(&mut *tx)
            .await?;

        let media = sqlx::query_as::<_, Media>(
            r#"
            INSERT INTO media (creator_id, file_name, file_size, content_type, download_handle,
                               download_url, created_at)
            SELECT $1, $2, $3, $4, $5, $6,
                   GREATEST(clock_timestamp(), (SELECT MAX(created_at) FROM media))
            WHERE EXISTS (SELECT 1 FROM users WHERE id = $1)
            RETURNING id, creator_id, file_name, file_size, content_type, download_handle,
                      download_url, created_at, likes_count, comments_count
            "#,
        )
        .bind(new_media.creator_id)
        .bind(&new_media.file_name)
        .bind(new_media.file_size)
        .bind(&new_media.content_type)
        .bind(&new_media.download_handle)
        .bind(&new_media.download_url)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::user_not_found(new_media.creator_id))?;

        tx.commit().await?;

        tracing::info!(media_id = media.id, "Media created");
        Ok(media)
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "select"))]
    async fn get_media(&self, media_id: i64) -> Result<Media, AppError> {
        let query = format!("SELECT {} FROM media m WHERE m.id = $1", MEDIA_COLUMNS);
        sqlx::query_as::<_, Media>(&query)
            .bind(media_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::media_not_found(media_id))
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "select"))]
    async fn list_feed(
        &self,
        _viewer_id: i64,
        page: PageRequest,
    ) -> Result<Page<Media>, AppError> {
        // An `after` id that matches no row makes the row comparison NULL, yielding an empty page.
        let query = format!(
            r#"
            SELECT {}
            FROM media m
            WHERE ($1::BIGINT IS NULL
                   OR (m.created_at, m.id) < (SELECT a.created_at, a.id FROM media a WHERE a.id = $1))
            ORDER BY m.created_at DESC, m.id DESC
            LIMIT $2
            "#,
            MEDIA_COLUMNS
        );

        let rows = sqlx::query_as::<_, Media>(&query)
            .bind(page.after)
            .bind(page.fetch_size())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::from_lookahead(rows, page.limit))
    }

    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
