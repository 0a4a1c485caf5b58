use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

use super::pagination::Paginated;

/// An uploaded media item.
///
/// `likes_count` and `comments_count` are denormalized counters. Only the engagement ledger
/// writes them, in the same unit of work as the like/comment row it inserts or deletes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: i64,
    pub creator_id: i64,
    pub file_name: String,
    pub file_size: i64,
    pub content_type: String,
    /// Blob store key used to fetch the bytes back
    pub download_handle: String,
    pub download_url: String,
    pub created_at: DateTime<Utc>,
    pub likes_count: i64,
    pub comments_count: i64,
}

impl Paginated for Media {
    fn sort_key(&self) -> (DateTime<Utc>, i64) {
        (self.created_at, self.id)
    }
}

/// Input for [`Media`] creation; id, timestamp and counters are assigned by the catalog.
#[derive(Debug, Clone)]
pub struct NewMedia {
    pub creator_id: i64,
    pub file_name: String,
    pub file_size: i64,
    pub content_type: String,
    pub download_handle: String,
    pub download_url: String,
}

/// A user as known to the identity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}
