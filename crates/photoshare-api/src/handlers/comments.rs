use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use photoshare_core::models::{Comment, CreateCommentRequest, Page};
use photoshare_core::AppError;
use validator::Validate;

use super::PageQuery;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson, ValidatedPath, ValidatedQuery};
use crate::state::AppState;

/// Comments on a media item, newest first
#[utoipa::path(
    get,
    path = "/{user_id}/media/{media_id}/comment",
    tag = "engagement",
    params(
        ("user_id" = i64, Path, description = "Requesting user"),
        ("media_id" = i64, Path, description = "Media ID"),
        PageQuery
    ),
    responses(
        (status = 200, description = "One page of comments", body = Page<Comment>),
        (status = 400, description = "Invalid cursor parameters", body = ErrorResponse),
        (status = 404, description = "User or media not found", body = ErrorResponse)
    )
)]
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    ValidatedPath((user_id, media_id)): ValidatedPath<(i64, i64)>,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> Result<Json<Page<Comment>>, HttpAppError> {
    let page = state
        .feed
        .comments(user_id, media_id, query.after, query.limit)
        .await?;
    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/{user_id}/media/{media_id}/comment",
    tag = "engagement",
    params(
        ("user_id" = i64, Path, description = "Comment author"),
        ("media_id" = i64, Path, description = "Media ID")
    ),
    request_body = CreateCommentRequest,
    responses(
        (status = 200, description = "Comment created", body = Comment),
        (status = 400, description = "Blank or oversized comment", body = ErrorResponse),
        (status = 404, description = "User or media not found", body = ErrorResponse)
    )
)]
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    ValidatedPath((user_id, media_id)): ValidatedPath<(i64, i64)>,
    ValidatedJson(request): ValidatedJson<CreateCommentRequest>,
) -> Result<Json<Comment>, HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let comment = state
        .feed
        .comment(user_id, media_id, &request.comment)
        .await?;
    Ok(Json(comment))
}

/// Delete a comment. Only its author may delete it.
#[utoipa::path(
    delete,
    path = "/{user_id}/media/{media_id}/comment/{comment_id}",
    tag = "engagement",
    params(
        ("user_id" = i64, Path, description = "Acting user"),
        ("media_id" = i64, Path, description = "Media ID"),
        ("comment_id" = i64, Path, description = "Comment ID")
    ),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 403, description = "Not the comment's author", body = ErrorResponse),
        (status = 404, description = "Comment not found on this media", body = ErrorResponse)
    )
)]
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    ValidatedPath((user_id, media_id, comment_id)): ValidatedPath<(i64, i64, i64)>,
) -> Result<StatusCode, HttpAppError> {
    state.feed.uncomment(user_id, media_id, comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
