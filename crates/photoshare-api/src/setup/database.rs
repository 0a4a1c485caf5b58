//! Database setup and initialization

use std::time::Duration;

use anyhow::{Context, Result};
use photoshare_core::Config;
use photoshare_db::{run_migrations, InMemoryStore, Repositories};
use sqlx::postgres::PgPoolOptions;

/// Connect to Postgres and apply migrations, or build the in-process engine for `memory://`.
pub async fn setup_repositories(config: &Config) -> Result<Repositories> {
    if config.uses_memory_database() {
        tracing::warn!("Using the in-memory engine; data is lost on restart");
        let store = InMemoryStore::with_open_registration(&config.feed);
        return Ok(Repositories::in_memory(store));
    }

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!(
        max_connections = config.db_max_connections,
        "Database connected successfully"
    );

    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    Ok(Repositories::postgres(pool, &config.feed))
}
