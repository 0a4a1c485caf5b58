use std::sync::Arc;

use axum::{extract::State, Json};
use photoshare_core::models::Media;

use crate::error::{ErrorResponse, HttpAppError, ValidatedPath};
use crate::state::AppState;

/// Media the user currently likes, most recently liked first
#[utoipa::path(
    get,
    path = "/{user_id}/liked",
    tag = "engagement",
    params(("user_id" = i64, Path, description = "User")),
    responses(
        (status = 200, description = "Liked media", body = Vec<Media>),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn liked_media(
    State(state): State<Arc<AppState>>,
    ValidatedPath(user_id): ValidatedPath<i64>,
) -> Result<Json<Vec<Media>>, HttpAppError> {
    Ok(Json(state.feed.liked_by(user_id).await?))
}

/// Media the user has commented on, by their most recent comment
#[utoipa::path(
    get,
    path = "/{user_id}/commented",
    tag = "engagement",
    params(("user_id" = i64, Path, description = "User")),
    responses(
        (status = 200, description = "Commented media", body = Vec<Media>),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn commented_media(
    State(state): State<Arc<AppState>>,
    ValidatedPath(user_id): ValidatedPath<i64>,
) -> Result<Json<Vec<Media>>, HttpAppError> {
    Ok(Json(state.feed.commented_by(user_id).await?))
}
