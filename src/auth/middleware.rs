//! Shared application state and the token-verifying interceptor.

use super::keys::KeyMaterial;
use super::token::{bearer_token, Rejection, TokenIssuer, TokenVerifier};
use super::Claims;
use crate::chain::{Endpoint, Interceptor};
use crate::config::Config;
use crate::error::AppError;
use crate::storage::CredentialStore;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use axum::response::IntoResponse;
use std::sync::Arc;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CredentialStore>,
    pub issuer: TokenIssuer,
    pub verifier: Arc<TokenVerifier>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the issuer and verifier to one key pair, with the expiry policy
    /// taken from `config`.
    pub fn new(config: Config, keys: Arc<KeyMaterial>, store: Arc<dyn CredentialStore>) -> Self {
        AppState {
            store,
            issuer: TokenIssuer::new(keys.clone()),
            verifier: Arc::new(TokenVerifier::new(keys, config.expiry_policy)),
            config: Arc::new(config),
        }
    }
}

/// Authenticate a request from its `Authorization: Bearer {token}` header.
pub fn authenticate(
    verifier: &TokenVerifier,
    headers: &HeaderMap,
    now: u64,
) -> Result<Claims, Rejection> {
    let token = match headers.get(AUTHORIZATION) {
        None => None,
        Some(value) => {
            let value = value.to_str().map_err(|_| Rejection::InvalidHeader)?;
            Some(bearer_token(value).ok_or(Rejection::InvalidHeader)?)
        }
    };

    verifier.verify(token, now)
}

/// Interceptor that only lets requests with a valid token through.
///
/// On success the verified [`Claims`] are added to the request extensions.
/// On failure the chain stops here with 401 Unauthorized.
pub fn require_token(verifier: Arc<TokenVerifier>) -> Interceptor {
    Interceptor::from_fn(move |mut request, next: Endpoint| {
        let verifier = verifier.clone();
        async move {
            let now = jsonwebtoken::get_current_timestamp();
            match authenticate(&verifier, request.headers(), now) {
                Ok(claims) => {
                    tracing::debug!(sub = %claims.sub, "Token accepted");
                    request.extensions_mut().insert(claims);
                    next.call(request).await
                }
                Err(rejection) => {
                    tracing::debug!(action = "token_rejected", reason = %rejection, "Request rejected");
                    AppError::from(rejection).into_response()
                }
            }
        }
    })
}
