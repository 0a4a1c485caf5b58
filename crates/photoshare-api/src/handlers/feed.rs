use std::sync::Arc;

use axum::{extract::State, Json};
use photoshare_core::models::{Media, Page};

use super::PageQuery;
use crate::error::{ErrorResponse, HttpAppError, ValidatedPath, ValidatedQuery};
use crate::state::AppState;

/// Newest-first feed of all media
#[utoipa::path(
    get,
    path = "/{user_id}/feed",
    tag = "feed",
    params(("user_id" = i64, Path, description = "Viewing user"), PageQuery),
    responses(
        (status = 200, description = "One page of the feed", body = Page<Media>),
        (status = 400, description = "Invalid cursor parameters", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn get_feed(
    State(state): State<Arc<AppState>>,
    ValidatedPath(user_id): ValidatedPath<i64>,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> Result<Json<Page<Media>>, HttpAppError> {
    let page = state.feed.feed(user_id, query.after, query.limit).await?;
    Ok(Json(page))
}
