/// JWT Claims structures
///
/// Access and refresh tokens carry different claim sets so that neither can
/// be decoded as the other.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Account;

/// Claims for RS256-signed access tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessTokenClaims {
    /// Snapshot of the account at issuance (never includes the password)
    pub account: Account,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl AccessTokenClaims {
    pub fn new(account: &Account, expiry_seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            account: account.clone(),
            iat: now,
            exp: now + expiry_seconds,
        }
    }
}

/// Claims for HS256-signed refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshTokenClaims {
    /// Owning account
    pub uid: Uuid,
    pub iat: i64,
    pub exp: i64,
    /// Token identifier, a v4 UUID rendered as a string
    pub jti: String,
}

impl RefreshTokenClaims {
    pub fn new(uid: Uuid, token_id: Uuid, expiry_seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            uid,
            iat: now,
            exp: now + expiry_seconds,
            jti: token_id.to_string(),
        }
    }

    /// Parse the `jti` claim as a UUID
    pub fn token_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.jti).ok()
    }

    pub fn is_expired(&self) -> bool {
        self.exp < chrono::Utc::now().timestamp()
    }
}
