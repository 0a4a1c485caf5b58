use std::sync::Arc;

use axum::{extract::State, http::header, response::IntoResponse};

use crate::error::{HttpAppError, ValidatedPath};
use crate::state::AppState;

/// Serve blob bytes behind a media's `downloadUrl`.
pub async fn serve_file(
    State(state): State<Arc<AppState>>,
    ValidatedPath(storage_key): ValidatedPath<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let data = state.feed.fetch_blob(&storage_key).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream"),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        data,
    ))
}
