//! Photoshare database layer
//!
//! Owns the media catalog, the engagement ledger (likes, comments and the counters they
//! maintain on media rows) and the identity lookup. Each concern is a trait with a Postgres
//! engine and an in-process engine behind it.

pub mod db;

pub use db::{
    run_migrations, EngagementLedger, IdentityStore, InMemoryStore, MediaCatalog,
    PgEngagementLedger, PgIdentityStore, PgMediaCatalog, Repositories,
};
