//! Photoshare API Library
//!
//! HTTP handlers, the feed service and application setup.

mod api_doc;
mod handlers;
mod telemetry;

pub mod error;
pub mod services;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use services::feed::{FeedService, MediaUpload};
pub use state::AppState;
