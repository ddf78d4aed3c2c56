/// Redis-backed revocation store
///
/// Each live refresh token is a key `{account_id}:{token_id}` holding `0`
/// with an expiry equal to the token's remaining lifetime.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use uuid::Uuid;

use super::{refresh_token_key, RevocationStore};
use crate::error::AppError;

#[derive(Clone)]
pub struct RedisRevocationStore {
    connection: ConnectionManager,
}

impl RedisRevocationStore {
    /// Connect to Redis at `url`
    ///
    /// # Errors
    /// Returns error if the URL is invalid or the server is unreachable
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        let client = redis::Client::open(url)?;
        let connection = client.get_connection_manager().await?;

        tracing::info!("Redis connection established");

        Ok(Self { connection })
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn set_refresh_token(
        &self,
        account_id: Uuid,
        token_id: Uuid,
        expires_in: Duration,
    ) -> Result<(), AppError> {
        let key = refresh_token_key(account_id, token_id);
        // SET EX rejects a zero expiry
        let seconds = expires_in.as_secs().max(1);

        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(&key, 0, seconds).await.map_err(|e| {
            tracing::error!(
                account_id = %account_id,
                token_id = %token_id,
                error = %e,
                "Could not SET refresh token"
            );
            AppError::from(e)
        })
    }

    async fn delete_refresh_token(
        &self,
        account_id: Uuid,
        token_id: Uuid,
    ) -> Result<bool, AppError> {
        let key = refresh_token_key(account_id, token_id);

        let mut conn = self.connection.clone();
        conn.del::<_, i64>(&key).await.map(|deleted| deleted > 0).map_err(|e| {
            tracing::error!(
                account_id = %account_id,
                token_id = %token_id,
                error = %e,
                "Could not DEL refresh token"
            );
            AppError::from(e)
        })
    }

    async fn has_refresh_token(&self, account_id: Uuid, token_id: Uuid) -> Result<bool, AppError> {
        let key = refresh_token_key(account_id, token_id);

        let mut conn = self.connection.clone();
        let exists: bool = conn.exists(&key).await?;
        Ok(exists)
    }

    async fn delete_user_refresh_tokens(&self, account_id: Uuid) -> Result<(), AppError> {
        let pattern = format!("{}:*", account_id);

        let mut conn = self.connection.clone();
        let keys: Vec<String> = conn.keys(&pattern).await?;
        if keys.is_empty() {
            return Ok(());
        }

        let deleted: i64 = conn.del(&keys).await?;
        tracing::info!(account_id = %account_id, deleted, "Refresh tokens revoked for account");

        Ok(())
    }
}
