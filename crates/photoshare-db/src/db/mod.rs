//! Repositories for the catalog, the engagement ledger and identity lookups
//!
//! Every concern is a trait so the HTTP layer can run against Postgres in production and the
//! in-process engine in tests or `memory://` deployments.

pub mod catalog;
pub mod identity;
pub mod ledger;
pub mod memory;
pub mod transaction;

use std::sync::Arc;

use photoshare_core::{AppError, FeedConfig};
use sqlx::PgPool;

pub use catalog::{MediaCatalog, PgMediaCatalog};
pub use identity::{IdentityStore, PgIdentityStore};
pub use ledger::{EngagementLedger, PgEngagementLedger};
pub use memory::InMemoryStore;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

/// Apply pending schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to run database migrations: {}", e)))
}

/// The three stores the feed service composes, backed by one engine.
#[derive(Clone)]
pub struct Repositories {
    pub identity: Arc<dyn IdentityStore>,
    pub catalog: Arc<dyn MediaCatalog>,
    pub ledger: Arc<dyn EngagementLedger>,
}

impl Repositories {
    pub fn postgres(pool: PgPool, feed: &FeedConfig) -> Self {
        tracing::info!("Initializing PostgreSQL repositories");
        Self {
            identity: Arc::new(PgIdentityStore::new(pool.clone())),
            catalog: Arc::new(PgMediaCatalog::new(pool.clone())),
            ledger: Arc::new(PgEngagementLedger::new(pool, feed.comment_max_length)),
        }
    }

    pub fn in_memory(store: InMemoryStore) -> Self {
        tracing::info!("Initializing in-memory repositories");
        Self {
            identity: Arc::new(store.clone()),
            catalog: Arc::new(store.clone()),
            ledger: Arc::new(store),
        }
    }
}
