/// Token Service
///
/// Issues access/refresh pairs and validates both token kinds. Refresh tokens
/// are rotated on use: issuing a pair from a previous refresh token deletes
/// that token's revocation entry before anything new is signed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::jwt::{self, TokenKeys};
use crate::configuration::TokenSettings;
use crate::domain::{Account, RefreshToken, TokenPair};
use crate::error::AppError;
use crate::repository::RevocationStore;

const ACCESS_TOKEN_REJECTED: &str = "Unable to verify user";
const REFRESH_TOKEN_REJECTED: &str = "Unable to verify user from refresh token";

pub struct TokenService {
    store: Arc<dyn RevocationStore>,
    keys: TokenKeys,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

impl TokenService {
    pub fn new(
        store: Arc<dyn RevocationStore>,
        keys: TokenKeys,
        access_token_expiry: i64,
        refresh_token_expiry: i64,
    ) -> Self {
        Self {
            store,
            keys,
            access_token_expiry,
            refresh_token_expiry,
        }
    }

    /// Load key files named in `settings`
    ///
    /// # Errors
    /// `AppError::Config` if a key file is unreadable or not a valid RSA PEM
    pub fn from_settings(
        settings: &TokenSettings,
        store: Arc<dyn RevocationStore>,
    ) -> Result<Self, AppError> {
        let keys = settings.load_keys()?;
        Ok(Self::new(
            store,
            keys,
            settings.access_token_expiry,
            settings.refresh_token_expiry,
        ))
    }

    /// Access token lifetime in seconds
    pub fn access_token_expiry(&self) -> i64 {
        self.access_token_expiry
    }

    /// Issue a new token pair, revoking `previous_token_id` first
    ///
    /// Rotation only proceeds if this call is the one that removed the
    /// previous entry, so two exchanges of the same refresh token cannot
    /// both succeed.
    ///
    /// The steps are sequential, not transactional. If recording the new
    /// refresh token fails, the signed token is never returned and, since
    /// refresh validation requires a store entry, could not be used anyway.
    ///
    /// # Errors
    /// - `AppError::Auth` if the previous token was already revoked or expired
    /// - whatever the store returns if the previous token cannot be deleted
    /// - `AppError::Internal` if signing or recording the new token fails
    pub async fn new_pair(
        &self,
        account: &Account,
        previous_token_id: Option<Uuid>,
    ) -> Result<TokenPair, AppError> {
        if let Some(previous) = previous_token_id {
            match self.store.delete_refresh_token(account.id, previous).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::warn!(
                        account_id = %account.id,
                        token_id = %previous,
                        "Previous refresh token was already revoked"
                    );
                    return Err(AppError::unauthorized(REFRESH_TOKEN_REJECTED));
                }
                Err(e) => {
                    tracing::error!(
                        account_id = %account.id,
                        token_id = %previous,
                        error = %e,
                        "Could not delete previous refresh token"
                    );
                    return Err(e);
                }
            }
        }

        let access_token =
            jwt::generate_access_token(account, &self.keys.encoding_key, self.access_token_expiry)
                .map_err(|e| {
                    tracing::error!(account_id = %account.id, error = %e, "Error generating access token");
                    AppError::Internal("Could not issue access token".to_string())
                })?;

        let refresh = jwt::generate_refresh_token(
            account.id,
            &self.keys.refresh_secret,
            self.refresh_token_expiry,
        )
        .map_err(|e| {
            tracing::error!(account_id = %account.id, error = %e, "Error generating refresh token");
            AppError::Internal("Could not issue refresh token".to_string())
        })?;

        self.store
            .set_refresh_token(account.id, refresh.id, refresh.expires_in)
            .await
            .map_err(|e| {
                tracing::error!(
                    account_id = %account.id,
                    token_id = %refresh.id,
                    error = %e,
                    "Error storing refresh token id"
                );
                AppError::Internal("Could not record refresh token".to_string())
            })?;

        tracing::debug!(account_id = %account.id, token_id = %refresh.id, "Token pair issued");

        Ok(TokenPair {
            access_token,
            refresh_token: refresh.token,
        })
    }

    /// Validate an access token and return the account it embeds
    ///
    /// # Errors
    /// `AppError::Auth` with one fixed message for every failure, so callers
    /// cannot tell expired, malformed and forged tokens apart
    pub fn validate_access_token(&self, token: &str) -> Result<Account, AppError> {
        jwt::validate_access_token(token, &self.keys.decoding_key)
            .map(|claims| claims.account)
            .map_err(|e| {
                tracing::debug!(error = %e, "Access token validation failed");
                AppError::unauthorized(ACCESS_TOKEN_REJECTED)
            })
    }

    /// Validate a refresh token and confirm it is still live in the store
    ///
    /// A rotated or signed-out token keeps a valid signature until it
    /// expires; the store lookup is what rejects it.
    ///
    /// # Errors
    /// - `AppError::Auth` if the token is invalid, expired or revoked
    /// - `AppError::Internal` if the store cannot be queried
    pub async fn validate_refresh_token(&self, token: &str) -> Result<RefreshToken, AppError> {
        let claims = jwt::validate_refresh_token(token, &self.keys.refresh_secret).map_err(|e| {
            tracing::warn!(error = %e, "Unable to validate or parse refresh token");
            AppError::unauthorized(REFRESH_TOKEN_REJECTED)
        })?;

        let id = claims
            .token_id()
            .ok_or_else(|| AppError::unauthorized(REFRESH_TOKEN_REJECTED))?;

        let live = self.store.has_refresh_token(claims.uid, id).await.map_err(|e| {
            tracing::error!(account_id = %claims.uid, token_id = %id, error = %e, "Revocation lookup failed");
            AppError::Internal("Could not check refresh token".to_string())
        })?;

        if !live {
            tracing::warn!(account_id = %claims.uid, token_id = %id, "Revoked refresh token presented");
            return Err(AppError::unauthorized(REFRESH_TOKEN_REJECTED));
        }

        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0)
            .ok_or_else(|| AppError::unauthorized(REFRESH_TOKEN_REJECTED))?;

        Ok(RefreshToken {
            token: token.to_string(),
            id,
            uid: claims.uid,
            expires_at,
        })
    }

    /// Revoke every refresh token of an account
    ///
    /// Outstanding access tokens stay valid until they expire.
    pub async fn signout(&self, account_id: Uuid) -> Result<(), AppError> {
        self.store.delete_user_refresh_tokens(account_id).await.map_err(|e| {
            tracing::error!(account_id = %account_id, error = %e, "Could not revoke refresh tokens");
            AppError::Internal("Could not sign out".to_string())
        })
    }
}
