//! Route configuration and setup

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use photoshare_core::Config;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::error::expose_error_details;
use crate::handlers::{activity, comments, feed, files, health, likes, media};
use crate::state::AppState;

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    let body_limit = config.max_file_size_bytes + MULTIPART_OVERHEAD_BYTES;

    tracing::info!(
        http_concurrency_limit = config.http_concurrency_limit,
        max_file_size_bytes = config.max_file_size_bytes,
        "HTTP limits configured"
    );

    let app = api_routes()
        .merge(public_routes())
        .merge(
            utoipa_rapidoc::RapiDoc::with_openapi("/api/openapi.json", crate::api_doc::openapi())
                .path("/docs"),
        )
        .layer(middleware::map_response_with_state(
            config.is_production(),
            expose_error_details,
        ))
        .layer(ConcurrencyLimitLayer::new(config.http_concurrency_limit))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}

/// Health probes and blob downloads
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::liveness_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/files/{*key}", get(files::serve_file))
}

/// User-scoped media and engagement routes. Collection routes accept a trailing slash.
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/{user_id}/media", post(media::upload_media))
        .route("/{user_id}/media/", post(media::upload_media))
        .route("/{user_id}/media/{media_id}", get(media::download_media))
        .route("/{user_id}/feed", get(feed::get_feed))
        .route("/{user_id}/feed/", get(feed::get_feed))
        .route(
            "/{user_id}/media/{media_id}/like",
            put(likes::like_media).delete(likes::dislike_media),
        )
        .route(
            "/{user_id}/media/{media_id}/comment",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/{user_id}/media/{media_id}/comment/",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/{user_id}/media/{media_id}/comment/{comment_id}",
            delete(comments::delete_comment),
        )
        .route("/{user_id}/liked", get(activity::liked_media))
        .route("/{user_id}/liked/", get(activity::liked_media))
        .route("/{user_id}/commented", get(activity::commented_media))
        .route("/{user_id}/commented/", get(activity::commented_media))
}
