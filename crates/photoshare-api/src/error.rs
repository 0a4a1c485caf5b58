//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Anything convertible into
//! [`AppError`] renders as the same envelope: `{timestamp, title, detail, code}` with the
//! status the error's metadata declares.
//!
//! Extractor rejections (bad JSON, non-numeric path segments, malformed query strings,
//! broken multipart bodies) are routed through the same envelope as validation errors.
//!
//! Sensitive errors render their client message. Outside production the
//! [`expose_error_details`] response layer swaps in the detailed message.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::{
        multipart::MultipartError, FromRequest, FromRequestParts, Path, Query, Request, State,
    },
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use photoshare_core::{AppError, ErrorMetadata, LogLevel};
use photoshare_storage::StorageError;
use serde::{de::DeserializeOwned, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub timestamp: DateTime<Utc>,
    /// Short summary, e.g. "Request Validation error"
    pub title: String,
    pub detail: String,
    /// Machine-readable error code for programmatic handling
    pub code: String,
}

/// Wrapper type for AppError to implement IntoResponse
///
/// `IntoResponse` and `AppError` are both foreign to this crate, so the orphan rule requires a
/// local newtype.
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        HttpAppError(AppError::Validation(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

impl From<QueryRejection> for HttpAppError {
    fn from(rejection: QueryRejection) -> Self {
        HttpAppError(AppError::Validation(format!(
            "Invalid query parameters: {}",
            rejection.body_text()
        )))
    }
}

impl From<PathRejection> for HttpAppError {
    fn from(rejection: PathRejection) -> Self {
        HttpAppError(AppError::Validation(format!(
            "Invalid path parameters: {}",
            rejection.body_text()
        )))
    }
}

impl From<MultipartError> for HttpAppError {
    fn from(err: MultipartError) -> Self {
        HttpAppError(multipart_error(err))
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        HttpAppError(storage_error(err))
    }
}

/// Body-limit failures surface from the multipart stream; keep their 413.
pub(crate) fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::Validation(format!("Failed to read multipart body: {}", err.body_text()))
    }
}

pub(crate) fn storage_error(err: StorageError) -> AppError {
    match err {
        StorageError::NotFound(msg) => AppError::NotFound(msg),
        StorageError::InvalidKey(msg) => AppError::Validation(msg),
        StorageError::IoError(err) => AppError::Storage(format!("IO error: {}", err)),
        other => AppError::Storage(other.to_string()),
    }
}

/// JSON body extractor that answers with [`ErrorResponse`] (400) on deserialization failure.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedJson(inner))
    }
}

/// Query string extractor with the shared error envelope.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(inner) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedQuery(inner))
    }
}

/// Path extractor with the shared error envelope.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(inner) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedPath(inner))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

/// Detailed envelope for a sensitive error, carried in the response extensions.
#[derive(Debug, Clone)]
struct SensitiveErrorDetail(ErrorResponse);

/// Response layer: unless `is_production`, replace a sensitive error's body with its details.
pub(crate) async fn expose_error_details(
    State(is_production): State<bool>,
    mut response: Response,
) -> Response {
    let detail = response.extensions_mut().remove::<SensitiveErrorDetail>();
    match detail {
        Some(SensitiveErrorDetail(body)) if !is_production => {
            (response.status(), Json(body)).into_response()
        }
        _ => response,
    }
}

impl ErrorResponse {
    pub fn from_app_error(error: &AppError, expose_details: bool) -> Self {
        // Sensitive errors only carry their internal chain outside production.
        let detail = if expose_details && error.is_sensitive() {
            error.detailed_message()
        } else {
            error.client_message()
        };

        Self {
            timestamp: Utc::now(),
            title: error.title().to_string(),
            detail,
            code: error.error_code().to_string(),
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let body = ErrorResponse::from_app_error(app_error, false);
        let mut response = (status, Json(body)).into_response();
        if app_error.is_sensitive() {
            response
                .extensions_mut()
                .insert(SensitiveErrorDetail(ErrorResponse::from_app_error(
                    app_error, true,
                )));
        }
        response
    }
}
