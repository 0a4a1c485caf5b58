//! Application state shared by every handler.

use photoshare_core::Config;

use crate::services::feed::FeedService;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub feed: FeedService,
}

impl AppState {
    pub fn new(config: Config, feed: FeedService) -> Self {
        Self { config, feed }
    }
}
