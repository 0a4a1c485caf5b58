pub mod activity;
pub mod comments;
pub mod feed;
pub mod files;
pub mod health;
pub mod likes;
pub mod media;

use serde::Deserialize;
use utoipa::IntoParams;

/// Cursor parameters shared by the feed and comment listings.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Id of the last item of the previous page
    pub after: Option<i64>,
    /// Page size; defaults to the configured default and is clamped to the configured maximum
    pub limit: Option<i64>,
}
