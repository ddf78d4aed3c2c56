/// JWT Token Generation and Validation
///
/// Access tokens are RS256-signed so any service holding the public key can
/// verify them. Refresh tokens are HS256-signed with a secret known only to
/// this service, which is the only place they are ever presented.

use std::time::Duration;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{AccessTokenClaims, RefreshTokenClaims};
use crate::domain::Account;
use crate::error::{AppError, AuthError, ConfigError};

/// Key material for both token kinds
#[derive(Clone)]
pub struct TokenKeys {
    pub(crate) encoding_key: EncodingKey,
    pub(crate) decoding_key: DecodingKey,
    pub(crate) refresh_secret: String,
}

impl TokenKeys {
    /// Build keys from PEM-encoded RSA keys and the refresh secret
    ///
    /// # Errors
    /// Returns `AppError::Config` if either PEM cannot be parsed
    pub fn from_pem(
        private_pem: &[u8],
        public_pem: &[u8],
        refresh_secret: impl Into<String>,
    ) -> Result<Self, AppError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_pem)
            .map_err(|e| ConfigError::InvalidKey(format!("private key: {}", e)))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem)
            .map_err(|e| ConfigError::InvalidKey(format!("public key: {}", e)))?;

        Ok(Self {
            encoding_key,
            decoding_key,
            refresh_secret: refresh_secret.into(),
        })
    }
}

/// A freshly signed refresh token
#[derive(Debug, Clone)]
pub struct SignedRefreshToken {
    pub token: String,
    pub id: Uuid,
    /// Remaining lifetime at issuance
    pub expires_in: Duration,
}

fn strict_validation(algorithm: Algorithm) -> Validation {
    let mut validation = Validation::new(algorithm);
    // A token is dead the second it expires
    validation.leeway = 0;
    validation
}

fn classify(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::TokenInvalid,
    }
}

/// Generate a new access token for an account
///
/// # Errors
/// Returns `AppError::Internal` if signing fails
pub fn generate_access_token(
    account: &Account,
    key: &EncodingKey,
    expiry_seconds: i64,
) -> Result<String, AppError> {
    let claims = AccessTokenClaims::new(account, expiry_seconds);

    encode(&Header::new(Algorithm::RS256), &claims, key)
        .map_err(|e| AppError::Internal(format!("Access token generation failed: {}", e)))
}

/// Validate an access token and extract its claims
///
/// # Errors
/// `AuthError::TokenExpired` past expiry, `AuthError::TokenInvalid` for a bad
/// signature, a foreign algorithm, or claims of the wrong shape
pub fn validate_access_token(
    token: &str,
    key: &DecodingKey,
) -> Result<AccessTokenClaims, AppError> {
    decode::<AccessTokenClaims>(token, key, &strict_validation(Algorithm::RS256))
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!("Access token rejected: {}", e);
            AppError::Auth(classify(e))
        })
}

/// Generate a new refresh token with a fresh identifier
///
/// # Errors
/// Returns `AppError::Internal` if signing fails
pub fn generate_refresh_token(
    uid: Uuid,
    secret: &str,
    expiry_seconds: i64,
) -> Result<SignedRefreshToken, AppError> {
    let id = Uuid::new_v4();
    let claims = RefreshTokenClaims::new(uid, id, expiry_seconds);

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Refresh token generation failed: {}", e)))?;

    Ok(SignedRefreshToken {
        token,
        id,
        expires_in: Duration::from_secs((claims.exp - claims.iat).max(0) as u64),
    })
}

/// Validate a refresh token and extract its claims
///
/// Only the signature and expiry are checked here; revocation is the token
/// service's concern.
///
/// # Errors
/// Same policy as [`validate_access_token`]; additionally `TokenInvalid` when
/// `jti` is not a UUID
pub fn validate_refresh_token(token: &str, secret: &str) -> Result<RefreshTokenClaims, AppError> {
    let claims = decode::<RefreshTokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &strict_validation(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!("Refresh token rejected: {}", e);
        AppError::Auth(classify(e))
    })?;

    if claims.token_id().is_none() {
        tracing::debug!(jti = %claims.jti, "Refresh token id is not a UUID");
        return Err(AuthError::TokenInvalid.into());
    }

    Ok(claims)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde::Serialize;

    pub(crate) const PRIVATE_PEM: &[u8] = include_bytes!("../../config/rsa_private_test.pem");
    pub(crate) const PUBLIC_PEM: &[u8] = include_bytes!("../../config/rsa_public_test.pem");
    const OTHER_PUBLIC_PEM: &[u8] = include_bytes!("../../config/rsa_public_other_test.pem");
    const SECRET: &str = "anotsorandomtestsecret-at-least-32-bytes";

    pub(crate) fn test_keys() -> TokenKeys {
        TokenKeys::from_pem(PRIVATE_PEM, PUBLIC_PEM, SECRET).expect("Failed to load test keys")
    }

    fn test_account() -> Account {
        Account {
            id: Uuid::new_v4(),
            email: "whuangz@gmail.com".to_string(),
            password: "blarghedymcblarghface".to_string(),
            name: "William".to_string(),
            image_url: "https://example.com/a.png".to_string(),
            website: "https://example.com".to_string(),
            created_at: None,
        }
    }

    fn assert_auth_error(result: Result<impl std::fmt::Debug, AppError>, expected: AuthError) {
        match result {
            Err(AppError::Auth(e)) => assert_eq!(e, expected),
            other => panic!("expected {:?}, got {:?}", expected, other),
        }
    }

    #[test]
    fn test_generate_and_validate_access_token() {
        let keys = test_keys();
        let account = test_account();

        let token = generate_access_token(&account, &keys.encoding_key, 900)
            .expect("Failed to generate token");
        let claims = validate_access_token(&token, &keys.decoding_key)
            .expect("Failed to validate token");

        assert_eq!(token.split('.').count(), 3);
        assert_eq!(claims.account.id, account.id);
        assert_eq!(claims.account.email, account.email);
        assert_eq!(claims.account.name, account.name);
        assert_eq!(claims.account.image_url, account.image_url);
        assert_eq!(claims.account.website, account.website);
        assert!(claims.account.password.is_empty());
        assert!((claims.exp - (chrono::Utc::now().timestamp() + 900)).abs() <= 5);
    }

    #[test]
    fn test_expired_access_token() {
        let keys = test_keys();
        let token = generate_access_token(&test_account(), &keys.encoding_key, -1)
            .expect("Failed to generate token");

        assert_auth_error(
            validate_access_token(&token, &keys.decoding_key),
            AuthError::TokenExpired,
        );
    }

    #[test]
    fn test_access_token_from_other_key() {
        let keys = test_keys();
        let other = DecodingKey::from_rsa_pem(OTHER_PUBLIC_PEM).unwrap();
        let token = generate_access_token(&test_account(), &keys.encoding_key, 900).unwrap();

        assert_auth_error(validate_access_token(&token, &other), AuthError::TokenInvalid);
    }

    #[test]
    fn test_tampered_access_token() {
        let keys = test_keys();
        let token = generate_access_token(&test_account(), &keys.encoding_key, 900).unwrap();

        let tampered = format!("{}X", token);
        assert!(validate_access_token(&tampered, &keys.decoding_key).is_err());
        assert!(validate_access_token("invalid.token.here", &keys.decoding_key).is_err());
    }

    #[test]
    fn test_generate_and_validate_refresh_token() {
        let uid = Uuid::new_v4();

        let signed = generate_refresh_token(uid, SECRET, 3600).expect("Failed to generate");
        let claims = validate_refresh_token(&signed.token, SECRET).expect("Failed to validate");

        assert_eq!(claims.uid, uid);
        assert_eq!(claims.token_id(), Some(signed.id));
        assert_eq!(signed.expires_in, Duration::from_secs(3600));
    }

    #[test]
    fn test_refresh_tokens_get_distinct_ids() {
        let uid = Uuid::new_v4();
        let first = generate_refresh_token(uid, SECRET, 3600).unwrap();
        let second = generate_refresh_token(uid, SECRET, 3600).unwrap();

        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_expired_refresh_token() {
        let signed = generate_refresh_token(Uuid::new_v4(), SECRET, -1).unwrap();

        assert_eq!(signed.expires_in, Duration::ZERO);
        assert_auth_error(
            validate_refresh_token(&signed.token, SECRET),
            AuthError::TokenExpired,
        );
    }

    #[test]
    fn test_refresh_token_with_wrong_secret() {
        let signed = generate_refresh_token(Uuid::new_v4(), SECRET, 3600).unwrap();

        assert_auth_error(
            validate_refresh_token(&signed.token, "some-other-secret"),
            AuthError::TokenInvalid,
        );
    }

    #[test]
    fn test_refresh_token_with_non_uuid_id() {
        let now = chrono::Utc::now().timestamp();
        let claims = RefreshTokenClaims {
            uid: Uuid::new_v4(),
            iat: now,
            exp: now + 3600,
            jti: "not-a-uuid".to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_auth_error(validate_refresh_token(&token, SECRET), AuthError::TokenInvalid);
    }

    #[test]
    fn test_token_kinds_are_not_interchangeable() {
        let keys = test_keys();
        let access = generate_access_token(&test_account(), &keys.encoding_key, 900).unwrap();
        let refresh = generate_refresh_token(Uuid::new_v4(), SECRET, 3600).unwrap();

        assert!(validate_refresh_token(&access, SECRET).is_err());
        assert!(validate_access_token(&refresh.token, &keys.decoding_key).is_err());
    }

    #[test]
    fn test_access_claims_shape_mismatch() {
        #[derive(Serialize)]
        struct Foreign {
            sub: String,
            exp: i64,
        }

        let keys = test_keys();
        let token = encode(
            &Header::new(Algorithm::RS256),
            &Foreign {
                sub: "someone".to_string(),
                exp: chrono::Utc::now().timestamp() + 900,
            },
            &keys.encoding_key,
        )
        .unwrap();

        assert_auth_error(
            validate_access_token(&token, &keys.decoding_key),
            AuthError::TokenInvalid,
        );
    }
}
