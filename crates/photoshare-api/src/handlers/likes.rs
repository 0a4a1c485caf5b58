use std::sync::Arc;

use axum::{extract::State, Json};
use photoshare_core::models::LikeResult;

use crate::error::{ErrorResponse, HttpAppError, ValidatedPath};
use crate::state::AppState;

/// Like a media item. Liking twice is a no-op.
#[utoipa::path(
    put,
    path = "/{user_id}/media/{media_id}/like",
    tag = "engagement",
    params(
        ("user_id" = i64, Path, description = "Acting user"),
        ("media_id" = i64, Path, description = "Media ID")
    ),
    responses(
        (status = 200, description = "Like count after the operation", body = LikeResult),
        (status = 404, description = "User or media not found", body = ErrorResponse)
    )
)]
pub async fn like_media(
    State(state): State<Arc<AppState>>,
    ValidatedPath((user_id, media_id)): ValidatedPath<(i64, i64)>,
) -> Result<Json<LikeResult>, HttpAppError> {
    let result = state.feed.like(user_id, media_id).await?;
    Ok(Json(result))
}

/// Remove a like. Removing a like that does not exist is a no-op.
#[utoipa::path(
    delete,
    path = "/{user_id}/media/{media_id}/like",
    tag = "engagement",
    params(
        ("user_id" = i64, Path, description = "Acting user"),
        ("media_id" = i64, Path, description = "Media ID")
    ),
    responses(
        (status = 200, description = "Like count after the operation", body = LikeResult),
        (status = 404, description = "User or media not found", body = ErrorResponse)
    )
)]
pub async fn dislike_media(
    State(state): State<Arc<AppState>>,
    ValidatedPath((user_id, media_id)): ValidatedPath<(i64, i64)>,
) -> Result<Json<LikeResult>, HttpAppError> {
    let result = state.feed.dislike(user_id, media_id).await?;
    Ok(Json(result))
}
