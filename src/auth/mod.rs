/// Authentication module
///
/// Password hashing, the access/refresh token codec, and the two services
/// built on them: account signup/signin and token issuance/validation.

mod account_service;
mod claims;
mod jwt;
mod password;
mod token_service;

pub use account_service::AccountService;
pub use claims::{AccessTokenClaims, RefreshTokenClaims};
pub use jwt::generate_access_token;
pub use jwt::generate_refresh_token;
pub use jwt::validate_access_token;
pub use jwt::validate_refresh_token;
pub use jwt::{SignedRefreshToken, TokenKeys};
pub use password::hash_password;
pub use password::verify_password;
pub use token_service::TokenService;
