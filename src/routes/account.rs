/// Account Routes
///
/// Signup, signin, token refresh, signout and current-account lookup.
/// Every successful credential exchange answers with a fresh token pair.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{AccountService, TokenService};
use crate::domain::{Account, TokenPair};
use crate::error::{AppError, ErrorContext};
use crate::validators::{is_valid_email, is_valid_password};

/// Signup and signin request
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Token refresh request
#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response carrying a newly issued token pair
#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl AuthResponse {
    fn new(pair: TokenPair, expires_in: i64) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

#[derive(Serialize)]
pub struct AccountResponse {
    pub account: Account,
}

/// POST /api/account/signup
///
/// # Errors
/// - 400: invalid email, or password outside 6..=30 characters
/// - 409: email already registered
/// - 500/503: hashing or persistence failure
pub async fn signup(
    form: web::Json<CredentialsRequest>,
    accounts: web::Data<AccountService>,
    tokens: web::Data<TokenService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("signup");
    let form = form.into_inner();

    let email = is_valid_email(&form.email)?;
    is_valid_password(&form.password)?;

    let account = accounts
        .signup(Account::with_credentials(email, form.password))
        .await
        .map_err(|e| context.record(e))?;

    let pair = tokens
        .new_pair(&account, None)
        .await
        .map_err(|e| context.record(e))?;

    tracing::info!(
        request_id = %context.request_id,
        account_id = %account.id,
        "Account signed up"
    );

    Ok(HttpResponse::Created().json(AuthResponse::new(pair, tokens.access_token_expiry())))
}

/// POST /api/account/signin
///
/// Unknown email and wrong password produce the same 401 response.
pub async fn signin(
    form: web::Json<CredentialsRequest>,
    accounts: web::Data<AccountService>,
    tokens: web::Data<TokenService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("signin");

    let account = accounts
        .signin(form.email.trim(), &form.password)
        .await
        .map_err(|e| context.record(e))?;

    let pair = tokens
        .new_pair(&account, None)
        .await
        .map_err(|e| context.record(e))?;

    tracing::info!(
        request_id = %context.request_id,
        account_id = %account.id,
        "Account signed in"
    );

    Ok(HttpResponse::Ok().json(AuthResponse::new(pair, tokens.access_token_expiry())))
}

/// POST /api/account/tokens
///
/// Exchanges a live refresh token for a new pair. The presented token is
/// revoked as part of the exchange, so it works exactly once.
pub async fn tokens(
    form: web::Json<RefreshRequest>,
    accounts: web::Data<AccountService>,
    tokens: web::Data<TokenService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");

    let refresh = tokens
        .validate_refresh_token(&form.refresh_token)
        .await
        .map_err(|e| context.record(e))?;
    let context = context.with_account_id(refresh.uid.to_string());

    let account = accounts.get(refresh.uid).await.map_err(|e| {
        context.record(match e {
            AppError::NotFound(_) => AppError::unauthorized("Unable to verify user from refresh token"),
            other => other,
        })
    })?;

    let pair = tokens
        .new_pair(&account, Some(refresh.id))
        .await
        .map_err(|e| context.record(e))?;

    tracing::info!(
        request_id = %context.request_id,
        account_id = %account.id,
        "Tokens refreshed"
    );

    Ok(HttpResponse::Ok().json(AuthResponse::new(pair, tokens.access_token_expiry())))
}

/// GET /api/account/me
///
/// Reads the account fresh from the repository rather than trusting the
/// snapshot embedded in the access token.
pub async fn me(
    current: web::ReqData<Account>,
    accounts: web::Data<AccountService>,
) -> Result<HttpResponse, AppError> {
    let account = accounts.get(current.id).await?;

    Ok(HttpResponse::Ok().json(AccountResponse { account }))
}

/// POST /api/account/signout
///
/// Revokes every refresh token of the caller. Access tokens already handed
/// out remain valid until they expire.
pub async fn signout(
    current: web::ReqData<Account>,
    tokens: web::Data<TokenService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("signout").with_account_id(current.id.to_string());

    tokens
        .signout(current.id)
        .await
        .map_err(|e| context.record(e))?;

    tracing::info!(request_id = %context.request_id, account_id = %current.id, "Account signed out");

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Signed out" })))
}

/// PUT /api/account/details
pub async fn details(_current: web::ReqData<Account>) -> Result<HttpResponse, AppError> {
    Err(AppError::NotImplemented("Updating account details".to_string()))
}

/// POST /api/account/image
pub async fn upload_image(_current: web::ReqData<Account>) -> Result<HttpResponse, AppError> {
    Err(AppError::NotImplemented("Uploading an account image".to_string()))
}

/// DELETE /api/account/image
pub async fn delete_image(_current: web::ReqData<Account>) -> Result<HttpResponse, AppError> {
    Err(AppError::NotImplemented("Deleting an account image".to_string()))
}
