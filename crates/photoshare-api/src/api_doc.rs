//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use photoshare_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Photoshare API",
        version = "0.1.0",
        description = "Media sharing API: uploads, a reverse-chronological feed, likes and comments."
    ),
    paths(
        handlers::media::upload_media,
        handlers::media::download_media,
        handlers::feed::get_feed,
        handlers::likes::like_media,
        handlers::likes::dislike_media,
        handlers::comments::list_comments,
        handlers::comments::create_comment,
        handlers::comments::delete_comment,
        handlers::activity::liked_media,
        handlers::activity::commented_media,
    ),
    components(schemas(
        models::Media,
        models::Comment,
        models::LikeResult,
        models::CreateCommentRequest,
        error::ErrorResponse,
    )),
    tags(
        (name = "media", description = "Upload and download"),
        (name = "feed", description = "Reverse-chronological feed"),
        (name = "engagement", description = "Likes and comments")
    )
)]
pub struct ApiDoc;

pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
