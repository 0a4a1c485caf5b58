use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

use super::pagination::Paginated;

/// Outcome of a like or dislike: the media's counter after the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeResult {
    pub media_id: i64,
    pub likes_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub media_id: i64,
    pub author_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Paginated for Comment {
    fn sort_key(&self) -> (DateTime<Utc>, i64) {
        (self.created_at, self.id)
    }
}

/// Request body for `POST /{userId}/media/{mediaId}/comment`.
///
/// The configured maximum length is enforced by the ledger after trimming.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CreateCommentRequest {
    #[validate(
        length(min = 1, message = "Comment text must not be empty"),
        custom(function = "crate::validation::validate_not_blank")
    )]
    pub comment: String,
}

/// Only the author may remove a comment.
pub fn can_delete_comment(actor_id: i64, comment: &Comment) -> bool {
    comment.author_id == actor_id
}
