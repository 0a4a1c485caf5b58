use std::sync::Arc;

use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use photoshare_core::models::Media;
use photoshare_core::AppError;

use crate::error::{multipart_error, ErrorResponse, HttpAppError, ValidatedPath};
use crate::services::feed::MediaUpload;
use crate::state::AppState;

const FILE_FIELD: &str = "file";

/// Read the single `file` field from a multipart form.
async fn extract_multipart_file(mut multipart: Multipart) -> Result<MediaUpload, AppError> {
    let mut upload: Option<MediaUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        if upload.is_some() {
            return Err(AppError::Validation(
                "Multiple file fields are not allowed; send exactly one field named 'file'"
                    .to_string(),
            ));
        }

        let file_name = field.file_name().unwrap_or("file").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await.map_err(multipart_error)?;

        upload = Some(MediaUpload {
            file_name,
            content_type,
            data,
        });
    }

    upload.ok_or_else(|| AppError::Validation("No file provided".to_string()))
}

/// Upload a media file
#[utoipa::path(
    post,
    path = "/{user_id}/media",
    tag = "media",
    params(("user_id" = i64, Path, description = "Uploading user")),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Media uploaded", body = Media),
        (status = 400, description = "Invalid upload", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn upload_media(
    State(state): State<Arc<AppState>>,
    ValidatedPath(user_id): ValidatedPath<i64>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Media>, HttpAppError> {
    let multipart = multipart.map_err(|rejection| {
        AppError::Validation(format!("Invalid multipart request: {}", rejection.body_text()))
    })?;
    let upload = extract_multipart_file(multipart).await?;
    let media = state.feed.upload_media(user_id, upload).await?;
    Ok(Json(media))
}

/// Download the raw bytes of a media item
#[utoipa::path(
    get,
    path = "/{user_id}/media/{media_id}",
    tag = "media",
    params(
        ("user_id" = i64, Path, description = "Requesting user"),
        ("media_id" = i64, Path, description = "Media ID")
    ),
    responses(
        (status = 200, description = "Media file", content_type = "application/octet-stream"),
        (status = 404, description = "Media not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn download_media(
    State(state): State<Arc<AppState>>,
    ValidatedPath((user_id, media_id)): ValidatedPath<(i64, i64)>,
) -> Result<impl IntoResponse, HttpAppError> {
    let (media, data) = state.feed.download_media(user_id, media_id).await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, media.content_type.as_str())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", media.file_name),
        )
        .body(Body::from(data))
        .map_err(|e| {
            tracing::error!(error = %e, media_id = media_id, "Failed to build response");
            AppError::Internal(e.to_string())
        })?;

    Ok(response)
}
