//! Row-locked units of work on a single media item
//!
//! Every ledger mutation opens a transaction and takes `FOR UPDATE` on the media row before it
//! touches likes or comments. Concurrent mutations on the same media therefore serialize on that
//! row, and the counters read under the lock are the values the transaction will overwrite.

use photoshare_core::AppError;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

/// Counter values read while holding the row lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaCounters {
    pub likes_count: i64,
    pub comments_count: i64,
}

/// An open transaction holding the lock on one media row.
///
/// Dropping the guard without calling [`MediaRowLock::commit`] rolls the transaction back.
pub struct MediaRowLock {
    tx: Transaction<'static, Postgres>,
    media_id: i64,
    counters: MediaCounters,
}

impl MediaRowLock {
    /// Begin a transaction and lock the media row; `NotFound` if it does not exist.
    pub async fn acquire(pool: &PgPool, media_id: i64) -> Result<Self, AppError> {
        let mut tx = pool.begin().await?;

        let row: Option<(i64, i64)> = sqlx::query_as(
            "SELECT likes_count, comments_count FROM media WHERE id = $1 FOR UPDATE",
        )
        .bind(media_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (likes_count, comments_count) =
            row.ok_or_else(|| AppError::media_not_found(media_id))?;

        Ok(Self {
            tx,
            media_id,
            counters: MediaCounters {
                likes_count,
                comments_count,
            },
        })
    }

    pub fn counters(&self) -> MediaCounters {
        self.counters
    }

    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.tx
    }

    pub async fn set_likes_count(&mut self, likes_count: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE media SET likes_count = $2 WHERE id = $1")
            .bind(self.media_id)
            .bind(likes_count)
            .execute(&mut *self.tx)
            .await?;
        self.counters.likes_count = likes_count;
        Ok(())
    }

    pub async fn set_comments_count(&mut self, comments_count: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE media SET comments_count = $2 WHERE id = $1")
            .bind(self.media_id)
            .bind(comments_count)
            .execute(&mut *self.tx)
            .await?;
        self.counters.comments_count = comments_count;
        Ok(())
    }

    pub async fn commit(self) -> Result<MediaCounters, AppError> {
        self.tx.commit().await?;
        Ok(self.counters)
    }
}
