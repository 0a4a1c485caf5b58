//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod storage;

use std::sync::Arc;

use anyhow::Result;
use photoshare_core::Config;

use crate::services::feed::FeedService;
use crate::state::AppState;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry();

    tracing::info!(
        environment = %config.environment,
        "Configuration loaded and validated successfully"
    );

    let repositories = database::setup_repositories(&config).await?;
    let blobs = storage::setup_storage(&config).await?;

    let feed = FeedService::new(repositories, blobs, &config);
    let state = Arc::new(AppState::new(config.clone(), feed));

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
