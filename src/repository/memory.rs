/// In-memory collaborators
///
/// Used by the test suites and for running the service without Postgres or
/// Redis. Expired revocation entries are dropped when looked up and swept
/// whenever a new entry is recorded.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{refresh_token_key, AccountRepository, RevocationStore};
use crate::domain::Account;
use crate::error::AppError;

#[derive(Default)]
pub struct InMemoryAccountRepository {
    accounts: RwLock<HashMap<Uuid, Account>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts
    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Account, AppError> {
        self.accounts
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("account with id {}", id)))
    }

    async fn find_by_email(&self, email: &str) -> Result<Account, AppError> {
        self.accounts
            .read()
            .await
            .values()
            .find(|account| account.email == email)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("account with email {}", email)))
    }

    async fn create(&self, mut account: Account) -> Result<Account, AppError> {
        let mut accounts = self.accounts.write().await;

        if accounts.values().any(|existing| existing.email == account.email) {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        account.id = Uuid::new_v4();
        account.created_at = Some(Utc::now());
        accounts.insert(account.id, account.clone());

        Ok(account)
    }
}

#[derive(Default)]
pub struct InMemoryRevocationStore {
    entries: RwLock<HashMap<String, Instant>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of unexpired entries
    pub async fn live_entries(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|deadline| **deadline > now)
            .count()
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn set_refresh_token(
        &self,
        account_id: Uuid,
        token_id: Uuid,
        expires_in: Duration,
    ) -> Result<(), AppError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, deadline| *deadline > now);
        entries.insert(refresh_token_key(account_id, token_id), now + expires_in);
        Ok(())
    }

    async fn delete_refresh_token(
        &self,
        account_id: Uuid,
        token_id: Uuid,
    ) -> Result<bool, AppError> {
        let removed = self
            .entries
            .write()
            .await
            .remove(&refresh_token_key(account_id, token_id));
        Ok(removed.is_some_and(|deadline| deadline > Instant::now()))
    }

    async fn has_refresh_token(&self, account_id: Uuid, token_id: Uuid) -> Result<bool, AppError> {
        let key = refresh_token_key(account_id, token_id);
        let mut entries = self.entries.write().await;

        match entries.get(&key) {
            Some(deadline) if *deadline > Instant::now() => Ok(true),
            Some(_) => {
                entries.remove(&key);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn delete_user_refresh_tokens(&self, account_id: Uuid) -> Result<(), AppError> {
        let prefix = format!("{}:", account_id);
        self.entries
            .write()
            .await
            .retain(|key, _| !key.starts_with(&prefix));
        Ok(())
    }
}
