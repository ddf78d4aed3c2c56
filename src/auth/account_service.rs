/// Account Service
///
/// Signup and signin on top of the account repository. Password hashing is
/// CPU-bound, so it runs on the blocking thread pool.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::domain::Account;
use crate::error::AppError;
use crate::repository::AccountRepository;

const INVALID_CREDENTIALS: &str = "Invalid email and password combination";
const CREATE_ACCOUNT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct AccountService {
    repo: Arc<dyn AccountRepository>,
}

impl AccountService {
    pub fn new(repo: Arc<dyn AccountRepository>) -> Self {
        Self { repo }
    }

    /// Fetch an account by id
    pub async fn get(&self, id: Uuid) -> Result<Account, AppError> {
        self.repo.find_by_id(id).await
    }

    /// Hash the supplied password and persist a new account
    ///
    /// `account.password` must hold the plaintext password. The returned
    /// account carries the assigned id and the stored hash.
    ///
    /// # Errors
    /// - `AppError::Internal` if hashing fails
    /// - `AppError::ServiceUnavailable` if the repository does not answer in time
    /// - repository errors unchanged (e.g. `AppError::Conflict`)
    pub async fn signup(&self, mut account: Account) -> Result<Account, AppError> {
        let password = std::mem::take(&mut account.password);
        account.password = run_blocking(move || hash_password(&password))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Password hashing failed during signup");
                AppError::Internal("Could not create account".to_string())
            })?;

        match tokio::time::timeout(CREATE_ACCOUNT_TIMEOUT, self.repo.create(account)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!("Account creation timed out");
                Err(AppError::ServiceUnavailable(
                    "account creation timed out".to_string(),
                ))
            }
        }
    }

    /// Check credentials and return the canonical stored account
    ///
    /// Unknown email and wrong password produce the same error.
    ///
    /// # Errors
    /// - `AppError::Auth` on bad credentials
    /// - `AppError::Internal` if the stored hash cannot be checked
    pub async fn signin(&self, email: &str, password: &str) -> Result<Account, AppError> {
        let account = self.repo.find_by_email(email).await.map_err(|e| {
            tracing::info!(error = %e, "Signin lookup failed");
            AppError::unauthorized(INVALID_CREDENTIALS)
        })?;

        let stored_hash = account.password.clone();
        let supplied = password.to_string();
        let matched = run_blocking(move || verify_password(&stored_hash, &supplied))
            .await
            .map_err(|e| {
                tracing::error!(account_id = %account.id, error = %e, "Password verification failed");
                AppError::Internal("Could not verify credentials".to_string())
            })?;

        if !matched {
            tracing::info!(account_id = %account.id, "Signin with wrong password");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }

        Ok(account)
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task failed: {}", e)))?
}
