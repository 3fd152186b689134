use crate::adapters::database::DbPool;
use crate::domain::push_token::PushToken;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Token store error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Durable mapping from token id to device push token.
#[async_trait]
pub trait TokenStore: Send + Sync + std::fmt::Debug {
    /// Returns every registered token in a stable order.
    ///
    /// # Errors
    /// Returns `StoreError` if the store cannot be read.
    async fn list(&self) -> Result<Vec<PushToken>, StoreError>;

    /// Atomically deletes all tokens with the given ids. Ids that no longer exist are ignored.
    ///
    /// # Errors
    /// Returns `StoreError` if the deletion fails; in that case no token is removed.
    async fn delete_many(&self, ids: &[String]) -> Result<(), StoreError>;

    /// Checks that the store is reachable.
    ///
    /// # Errors
    /// Returns `StoreError` if the store does not respond.
    async fn ping(&self) -> Result<(), StoreError>;
}

#[derive(Clone, Debug)]
pub struct PushTokenRepository {
    pool: DbPool,
}

impl PushTokenRepository {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for PushTokenRepository {
    #[tracing::instrument(level = "debug", skip(self), err)]
    async fn list(&self) -> Result<Vec<PushToken>, StoreError> {
        let tokens = sqlx::query_as::<_, PushToken>("SELECT id, token FROM push_tokens ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await?;

        Ok(tokens)
    }

    #[tracing::instrument(level = "debug", skip(self, ids), fields(count = ids.len()), err)]
    async fn delete_many(&self, ids: &[String]) -> Result<(), StoreError> {
        if ids.is_empty() {
            return Ok(());
        }

        // A single statement is atomic on its own.
        let result = sqlx::query("DELETE FROM push_tokens WHERE id = ANY($1)").bind(ids).execute(&self.pool).await?;

        tracing::debug!(requested = ids.len(), deleted = result.rows_affected(), "Deleted push tokens");
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
