/// Bearer Authentication Middleware
///
/// Validates the access token from the Authorization header and injects the
/// embedded `Account` into request extensions for route handlers.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::TokenService;
use crate::error::{AppError, AuthError};

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Middleware for protecting routes
///
/// Must wrap every scope whose handlers take `web::ReqData<Account>`.
pub struct JwtMiddleware {
    tokens: web::Data<TokenService>,
}

impl JwtMiddleware {
    pub fn new(tokens: web::Data<TokenService>) -> Self {
        Self { tokens }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            tokens: self.tokens.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    tokens: web::Data<TokenService>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let header = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok());

        let token = match header {
            None => {
                tracing::warn!(path = %req.path(), "Missing Authorization header");
                return Box::pin(async { Err(AppError::Auth(AuthError::MissingToken).into()) });
            }
            Some(value) => match bearer_token(value) {
                Some(token) => token.to_string(),
                None => {
                    tracing::warn!(path = %req.path(), "Malformed Authorization header");
                    return Box::pin(async {
                        Err(AppError::unauthorized(
                            "Authorization header must have the format `Bearer {token}`",
                        )
                        .into())
                    });
                }
            },
        };

        match self.tokens.validate_access_token(&token) {
            Ok(account) => {
                tracing::debug!(account_id = %account.id, "Access token validated");
                req.extensions_mut().insert(account);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(_) => Box::pin(async {
                Err(AppError::unauthorized("Provided token is invalid").into())
            }),
        }
    }
}
