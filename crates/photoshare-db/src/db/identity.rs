//! Identity lookups
//!
//! Users are owned by an external identity service. The ledger only needs to know whether an
//! id resolves; provisioning is exposed for seeding and tests.

use async_trait::async_trait;
use photoshare_core::models::User;
use photoshare_core::AppError;
use sqlx::PgPool;

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn user_exists(&self, user_id: i64) -> Result<bool, AppError>;

    async fn create_user(&self, username: &str) -> Result<User, AppError>;

    /// Fails with `NotFound` when the id does not resolve.
    async fn ensure_user(&self, user_id: i64) -> Result<(), AppError> {
        if self.user_exists(user_id).await? {
            Ok(())
        } else {
            Err(AppError::user_not_found(user_id))
        }
    }
}

#[derive(Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    async fn user_exists(&self, user_id: i64) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "insert"))]
    async fn create_user(&self, username: &str) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username)
            VALUES ($1)
            ON CONFLICT (username) DO NOTHING
            RETURNING id, username, created_at
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("Username '{}' is already taken", username)))?;

        tracing::info!(user_id = user.id, "User created");
        Ok(user)
    }
}
