/// Password Hashing and Verification
///
/// Passwords are stretched with scrypt using a per-password random salt.
/// The stored form is `hex(derived_key).hex(salt)`.

use rand::rngs::OsRng;
use rand::RngCore;
use scrypt::{scrypt, Params};
use subtle::ConstantTimeEq;

use crate::error::{AppError, ValidationError};

const SALT_LEN: usize = 32;
const KEY_LEN: usize = 32;
// N = 2^15 = 32768
const LOG_N: u8 = 15;
const R: u32 = 8;
const P: u32 = 1;
const DELIMITER: char = '.';

fn derive_key(password: &str, salt: &[u8]) -> Result<[u8; KEY_LEN], AppError> {
    let params = Params::new(LOG_N, R, P, KEY_LEN)
        .map_err(|e| AppError::Internal(format!("Invalid scrypt parameters: {}", e)))?;

    let mut key = [0u8; KEY_LEN];
    scrypt(password.as_bytes(), salt, &params, &mut key)
        .map_err(|e| AppError::Internal(format!("Key derivation failed: {}", e)))?;

    Ok(key)
}

/// Hash a password with a fresh random salt
///
/// # Errors
/// Returns `AppError::Internal` if the OS random source or scrypt fails
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let mut salt = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| AppError::Internal(format!("Salt generation failed: {}", e)))?;

    let key = derive_key(password, &salt)?;

    Ok(format!("{}{}{}", hex::encode(key), DELIMITER, hex::encode(salt)))
}

/// Verify a password against its stored hash
///
/// # Errors
/// - `AppError::Validation(MalformedHash)` if the stored hash cannot be decoded
/// - `AppError::Internal` if scrypt fails
pub fn verify_password(stored_hash: &str, password: &str) -> Result<bool, AppError> {
    let (stored_key, salt) = split_hash(stored_hash)?;

    let key = derive_key(password, &salt)?;

    Ok(key[..].ct_eq(&stored_key[..]).into())
}

fn split_hash(stored_hash: &str) -> Result<(Vec<u8>, Vec<u8>), ValidationError> {
    let mut parts = stored_hash.split(DELIMITER);

    let (key_hex, salt_hex) = match (parts.next(), parts.next(), parts.next()) {
        (Some(key), Some(salt), None) if !key.is_empty() && !salt.is_empty() => (key, salt),
        _ => return Err(ValidationError::MalformedHash),
    };

    let key = hex::decode(key_hex).map_err(|_| ValidationError::MalformedHash)?;
    let salt = hex::decode(salt_hex).map_err(|_| ValidationError::MalformedHash)?;

    Ok((key, salt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let password = "admin123";
        let hash = hash_password(password).expect("Failed to hash password");

        assert_ne!(password, hash);

        let (key, salt) = hash.split_once(DELIMITER).expect("Missing delimiter");
        assert_eq!(key.len(), KEY_LEN * 2);
        assert_eq!(salt.len(), SALT_LEN * 2);
        assert!(hash
            .chars()
            .all(|c| c == DELIMITER || c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("admin123").expect("Failed to hash password");

        let is_valid = verify_password(&hash, "admin123").expect("Failed to verify password");
        assert!(is_valid);
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hash_password("admin123").expect("Failed to hash password");

        let is_valid = verify_password(&hash, "admin124").expect("Failed to verify password");
        assert!(!is_valid);
    }

    #[test]
    fn test_hash_is_salted() {
        let first = hash_password("admin123").expect("Failed to hash password");
        let second = hash_password("admin123").expect("Failed to hash password");

        assert_ne!(first, second);
        assert!(verify_password(&first, "admin123").unwrap());
        assert!(verify_password(&second, "admin123").unwrap());
    }

    #[test]
    fn test_malformed_hashes() {
        let salt = hex::encode([7u8; SALT_LEN]);
        let cases = vec![
            "".to_string(),
            "nodelimiter".to_string(),
            format!("abcd.{}.extra", salt),
            format!(".{}", salt),
            "abcd.".to_string(),
            format!("zz.{}", salt),
            "abcd.not-hex".to_string(),
        ];

        for stored in cases {
            let result = verify_password(&stored, "admin123");
            assert!(
                matches!(result, Err(AppError::Validation(ValidationError::MalformedHash))),
                "expected malformed hash error for {:?}",
                stored
            );
        }
    }

    #[test]
    fn test_truncated_key_does_not_match() {
        let hash = hash_password("admin123").expect("Failed to hash password");
        let (key, salt) = hash.split_once(DELIMITER).unwrap();
        let truncated = format!("{}{}{}", &key[..KEY_LEN], DELIMITER, salt);

        assert!(!verify_password(&truncated, "admin123").unwrap());
    }
}
