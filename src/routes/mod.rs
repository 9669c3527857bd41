//! API route handlers.

pub mod auth;

use crate::auth::middleware::{require_token, AppState};
use crate::chain::{Chain, Endpoint};
use crate::middleware::security_headers;
use axum::{extract::DefaultBodyLimit, routing::get, routing::post, Router};
use tower_http::trace::TraceLayer;

/// Build the API router with all endpoints.
///
/// Each route is an interceptor chain around its handler. Security headers
/// sit outermost so rejections from inner interceptors carry them too.
pub fn api_router(state: AppState) -> Router {
    let login = Chain::new()
        .with(security_headers())
        .compose(Endpoint::from_handler(auth::login, state.clone()));

    let validate = Chain::new()
        .with(security_headers())
        .with(require_token(state.verifier.clone()))
        .compose(Endpoint::from_handler(auth::validate, state.clone()));

    Router::new()
        .route("/login", post(login.into_handler()))
        .route("/validate", get(validate.into_handler()))
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
}
