/// Repository module
///
/// Collaborators consumed by the authentication services: account
/// persistence and the refresh-token revocation store. Services hold them as
/// `Arc<dyn Trait>` so production backends and in-memory doubles are
/// interchangeable.

mod account;
mod memory;
mod token;

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::Account;
use crate::error::AppError;

pub use account::PgAccountRepository;
pub use memory::{InMemoryAccountRepository, InMemoryRevocationStore};
pub use token::RedisRevocationStore;

/// Account persistence
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// # Errors
    /// `AppError::NotFound` when no account has this id
    async fn find_by_id(&self, id: Uuid) -> Result<Account, AppError>;

    /// Returns the account including its stored password hash
    ///
    /// # Errors
    /// `AppError::NotFound` when no account has this email
    async fn find_by_email(&self, email: &str) -> Result<Account, AppError>;

    /// Persist a new account, assigning its id and creation time
    ///
    /// # Errors
    /// `AppError::Conflict` when the email is already registered
    async fn create(&self, account: Account) -> Result<Account, AppError>;
}

/// Live refresh-token identifiers, one entry per `(account, token id)`
///
/// Presence of an entry means the token may still be exchanged; deleting it
/// is revocation. Entries expire on their own once the token would.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    async fn set_refresh_token(
        &self,
        account_id: Uuid,
        token_id: Uuid,
        expires_in: Duration,
    ) -> Result<(), AppError>;

    /// Remove one entry, returning whether it was still live
    ///
    /// Exactly one caller can observe `true` for a given entry, which is what
    /// makes a refresh token single-use under concurrent exchanges.
    async fn delete_refresh_token(&self, account_id: Uuid, token_id: Uuid)
        -> Result<bool, AppError>;

    async fn has_refresh_token(&self, account_id: Uuid, token_id: Uuid) -> Result<bool, AppError>;

    /// Revoke every live refresh token of an account
    async fn delete_user_refresh_tokens(&self, account_id: Uuid) -> Result<(), AppError>;
}

/// Store key for a refresh token entry
pub(crate) fn refresh_token_key(account_id: Uuid, token_id: Uuid) -> String {
    format!("{}:{}", account_id, token_id)
}
