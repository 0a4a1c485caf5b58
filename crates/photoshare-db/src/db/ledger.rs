//! Engagement ledger: likes, comments and the counters they maintain
//!
//! A like or comment row and the matching counter on its media row change in one unit of work.
//! Likes are idempotent per `(media_id, user_id)`: repeating a like or a dislike leaves both the
//! like set and the counter untouched.

use async_trait::async_trait;
use photoshare_core::models::{can_delete_comment, Comment, LikeResult, Media, Page, PageRequest};
use photoshare_core::validation::normalize_comment_text;
use photoshare_core::AppError;
use sqlx::PgPool;

use super::catalog::MEDIA_COLUMNS;
use super::transaction::MediaRowLock;

#[async_trait]
pub trait EngagementLedger: Send + Sync {
    /// Record a like; a repeat like is a no-op. Returns the resulting like count.
    async fn like(&self, user_id: i64, media_id: i64) -> Result<LikeResult, AppError>;

    /// Remove a like; removing a like that does not exist is a no-op.
    async fn dislike(&self, user_id: i64, media_id: i64) -> Result<LikeResult, AppError>;

    async fn comment(&self, user_id: i64, media_id: i64, text: &str)
        -> Result<Comment, AppError>;

    /// Delete a comment on `media_id`. Only the author may delete it.
    async fn uncomment(&self, user_id: i64, media_id: i64, comment_id: i64)
        -> Result<(), AppError>;

    async fn list_comments(&self, media_id: i64, page: PageRequest)
        -> Result<Page<Comment>, AppError>;

    /// Media the user currently likes, most recently liked first.
    async fn list_media_liked_by(&self, user_id: i64) -> Result<Vec<Media>, AppError>;

    /// Media the user has at least one comment on, ordered by their latest comment.
    async fn list_media_commented_by(&self, user_id: i64) -> Result<Vec<Media>, AppError>;
}

/// Decrement a counter, clamping at zero.
///
/// A counter already at zero while a row is being removed means the ledger and the counters
/// disagree; that is logged rather than surfaced to the caller.
pub(crate) fn clamp_decrement(current: i64, media_id: i64, counter: &'static str) -> i64 {
    if current <= 0 {
        tracing::error!(
            media_id = media_id,
            counter = counter,
            current = current,
            "Counter underflow on media, clamping to zero"
        );
        0
    } else {
        current - 1
    }
}

#[derive(Clone)]
pub struct PgEngagementLedger {
    pool: PgPool,
    comment_max_length: usize,
}

impl PgEngagementLedger {
    pub fn new(pool: PgPool, comment_max_length: usize) -> Self {
        Self {
            pool,
            comment_max_length,
        }
    }
}

#[async_trait]
impl EngagementLedger for PgEngagementLedger {
    #[tracing::instrument(skip(self), fields(db.table = "likes", db.operation = "insert"))]
    async fn like(&self, user_id: i64, media_id: i64) -> Result<LikeResult, AppError> {
        let mut lock = MediaRowLock::acquire(&self.pool, media_id).await?;

        let inserted = sqlx::query(
            "INSERT INTO likes (media_id, user_id) VALUES ($1, $2) ON CONFLICT (media_id, user_id) DO NOTHING",
        )
        .bind(media_id)
        .bind(user_id)
        .execute(lock.conn())
        .await?
        .rows_affected()
            == 1;

        if inserted {
            let next = lock.counters().likes_count + 1;
            lock.set_likes_count(next).await?;
        }

        let counters = lock.commit().await?;
        if inserted {
            tracing::debug!(likes_count = counters.likes_count, "Like recorded");
        }

        Ok(LikeResult {
            media_id,
            likes_count: counters.likes_count,
        })
    }

    #[tracing::instrument(skip(self), fields(db.table = "likes", db.operation = "delete"))]
    async fn dislike(&self, user_id: i64, media_id: i64) -> Result<LikeResult, AppError> {
        let mut lock = MediaRowLock::acquire(&self.pool, media_id).await?;

        let removed = sqlx::query("DELETE FROM likes WHERE media_id = $1 AND user_id = $2")
            .bind(media_id)
            .bind(user_id)
            .execute(lock.conn())
            .await?
            .rows_affected()
            == 1;

        if removed {
            let next = clamp_decrement(lock.counters().likes_count, media_id, "likes_count");
            lock.set_likes_count(next).await?;
        }

        let counters = lock.commit().await?;
        Ok(LikeResult {
            media_id,
            likes_count: counters.likes_count,
        })
    }

    #[tracing::instrument(skip(self, text), fields(db.table = "comments", db.operation = "insert"))]
    async fn comment(
        &self,
        user_id: i64,
        media_id: i64,
        text: &str,
    ) -> Result<Comment, AppError> {
        let text = normalize_comment_text(text, self.comment_max_length)?;
        let mut lock = MediaRowLock::acquire(&self.pool, media_id).await?;

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (media_id, author_id, text)
            VALUES ($1, $2, $3)
            RETURNING id, media_id, author_id, text, created_at
            "#,
        )
        .bind(media_id)
        .bind(user_id)
        .bind(&text)
        .fetch_one(lock.conn())
        .await?;

        let next = lock.counters().comments_count + 1;
        lock.set_comments_count(next).await?;
        lock.commit().await?;

        tracing::debug!(comment_id = comment.id, "Comment created");
        Ok(comment)
    }

    #[tracing::instrument(skip(self), fields(db.table = "comments", db.operation = "delete"))]
    async fn uncomment(
        &self,
        user_id: i64,
        media_id: i64,
        comment_id: i64,
    ) -> Result<(), AppError> {
        let mut lock = MediaRowLock::acquire(&self.pool, media_id).await?;

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, media_id, author_id, text, created_at
            FROM comments
            WHERE id = $1 AND media_id = $2
            "#,
        )
        .bind(comment_id)
        .bind(media_id)
        .fetch_optional(lock.conn())
        .await?
        .ok_or_else(|| AppError::comment_not_found(comment_id, media_id))?;

        if !can_delete_comment(user_id, &comment) {
            return Err(AppError::Forbidden(format!(
                "User {} may not delete comment {}",
                user_id, comment_id
            )));
        }

        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(lock.conn())
            .await?;

        let next = clamp_decrement(lock.counters().comments_count, media_id, "comments_count");
        lock.set_comments_count(next).await?;
        lock.commit().await?;

        tracing::debug!("Comment deleted");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "comments", db.operation = "select"))]
    async fn list_comments(
        &self,
        media_id: i64,
        page: PageRequest,
    ) -> Result<Page<Comment>, AppError> {
        let media_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM media WHERE id = $1)")
                .bind(media_id)
                .fetch_one(&self.pool)
                .await?;
        if !media_exists {
            return Err(AppError::media_not_found(media_id));
        }

        let rows = sqlx::query_as::<_, Comment>(
            r#"
            SELECT c.id, c.media_id, c.author_id, c.text, c.created_at
            FROM comments c
            WHERE c.media_id = $1
              AND ($2::BIGINT IS NULL
                   OR (c.created_at, c.id) < (SELECT a.created_at, a.id
                                              FROM comments a
                                              WHERE a.id = $2 AND a.media_id = $1))
            ORDER BY c.created_at DESC, c.id DESC
            LIMIT $3
            "#,
        )
        .bind(media_id)
        .bind(page.after)
        .bind(page.fetch_size())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::from_lookahead(rows, page.limit))
    }

    #[tracing::instrument(skip(self), fields(db.table = "likes", db.operation = "select"))]
    async fn list_media_liked_by(&self, user_id: i64) -> Result<Vec<Media>, AppError> {
        let query = format!(
            r#"
            SELECT {}
            FROM likes l
            JOIN media m ON m.id = l.media_id
            WHERE l.user_id = $1
            ORDER BY l.created_at DESC, m.id DESC
            "#,
            MEDIA_COLUMNS
        );
        let media = sqlx::query_as::<_, Media>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(media)
    }

    #[tracing::instrument(skip(self), fields(db.table = "comments", db.operation = "select"))]
    async fn list_media_commented_by(&self, user_id: i64) -> Result<Vec<Media>, AppError> {
        let query = format!(
            r#"
            SELECT {}
            FROM media m
            JOIN (
                SELECT media_id, MAX(created_at) AS last_at, MAX(id) AS last_id
                FROM comments
                WHERE author_id = $1
                GROUP BY media_id
            ) c ON c.media_id = m.id
            ORDER BY c.last_at DESC, c.last_id DESC
            "#,
            MEDIA_COLUMNS
        );
        let media = sqlx::query_as::<_, Media>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(media)
    }
}
