use crate::auth::TokenKeys;
use crate::error::{AppError, ConfigError};

const MIN_REFRESH_SECRET_LENGTH: usize = 32;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub redis: RedisSettings,
    pub tokens: TokenSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct RedisSettings {
    pub url: String,
}

/// Token signing settings
#[derive(serde::Deserialize, Clone)]
pub struct TokenSettings {
    /// PEM file with the RSA private key signing access tokens
    pub private_key_file: String,
    /// PEM file with the matching RSA public key
    pub public_key_file: String,
    /// HMAC secret signing refresh tokens
    pub refresh_secret: String,
    pub access_token_expiry: i64,   // seconds (e.g., 900 for 15 minutes)
    pub refresh_token_expiry: i64,  // seconds (e.g., 259200 for 3 days)
}

impl TokenSettings {
    /// Reject lifetimes and secrets that would make tokens unusable or weak
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_token_expiry <= 0 {
            return Err(ConfigError::InvalidValue(
                "tokens.access_token_expiry must be positive".to_string(),
            ));
        }
        if self.refresh_token_expiry <= 0 {
            return Err(ConfigError::InvalidValue(
                "tokens.refresh_token_expiry must be positive".to_string(),
            ));
        }
        if self.refresh_secret.len() < MIN_REFRESH_SECRET_LENGTH {
            return Err(ConfigError::InvalidValue(format!(
                "tokens.refresh_secret must be at least {} bytes",
                MIN_REFRESH_SECRET_LENGTH
            )));
        }
        Ok(())
    }

    /// Read both key files and build the signing keys
    pub fn load_keys(&self) -> Result<TokenKeys, AppError> {
        let private_pem = std::fs::read(&self.private_key_file).map_err(|e| {
            ConfigError::MissingRequired(format!("{}: {}", self.private_key_file, e))
        })?;
        let public_pem = std::fs::read(&self.public_key_file).map_err(|e| {
            ConfigError::MissingRequired(format!("{}: {}", self.public_key_file, e))
        })?;

        TokenKeys::from_pem(&private_pem, &public_pem, self.refresh_secret.clone())
    }
}

/// Load settings from `configuration.{yaml,json,toml}` and `APP__*` variables
///
/// `APP__TOKENS__REFRESH_SECRET=...` overrides `tokens.refresh_secret`.
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_settings() -> TokenSettings {
        TokenSettings {
            private_key_file: "config/rsa_private_test.pem".to_string(),
            public_key_file: "config/rsa_public_test.pem".to_string(),
            refresh_secret: "anotsorandomtestsecret-at-least-32-bytes".to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 259200,
        }
    }

    #[test]
    fn test_valid_token_settings() {
        assert!(token_settings().validate().is_ok());
    }

    #[test]
    fn test_non_positive_expiry_is_rejected() {
        let mut settings = token_settings();
        settings.access_token_expiry = 0;
        assert!(settings.validate().is_err());

        let mut settings = token_settings();
        settings.refresh_token_expiry = -1;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_short_refresh_secret_is_rejected() {
        let mut settings = token_settings();
        settings.refresh_secret = "short".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_keys_from_files() {
        assert!(token_settings().load_keys().is_ok());
    }

    #[test]
    fn test_missing_key_file() {
        let mut settings = token_settings();
        settings.private_key_file = "config/does_not_exist.pem".to_string();

        assert!(matches!(settings.load_keys(), Err(AppError::Config(_))));
    }
}
