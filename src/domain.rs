/// Domain types shared by the authentication services and the HTTP layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An account as stored by the account repository
///
/// `password` holds the encoded password hash once persisted (or the
/// plaintext password on its way into signup). It is never serialized,
/// so it cannot leak into access-token claims or API responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    #[serde(skip)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub website: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Account carrying only the credentials supplied by a client
    pub fn with_credentials(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            ..Default::default()
        }
    }
}

/// Access/refresh token pair returned once per issuance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// A refresh token that passed signature, expiry and revocation checks
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshToken {
    /// The signed token string as presented
    pub token: String,
    /// Token identifier (`jti`)
    pub id: Uuid,
    /// Owning account
    pub uid: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_is_never_serialized() {
        let mut account = Account::with_credentials("a@b.com", "admin123");
        account.id = Uuid::new_v4();

        let json = serde_json::to_value(&account).expect("Failed to serialize account");

        assert!(json.get("password").is_none());
        assert_eq!(json["email"], "a@b.com");
        assert!(!json.to_string().contains("admin123"));
    }

    #[test]
    fn test_deserialized_account_has_empty_password() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "email": "a@b.com",
            "password": "should-be-ignored",
        });

        let account: Account = serde_json::from_value(json).expect("Failed to deserialize");

        assert!(account.password.is_empty());
        assert!(account.name.is_empty());
    }
}
