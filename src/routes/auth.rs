//! Login and validation endpoints.

use crate::auth::middleware::AppState;
use crate::auth::Claims;
use crate::error::AppError;
use crate::models::{LoginRequest, TokenResponse};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};

/// POST /login — Exchange a username and password for a signed token
pub async fn login(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    // Parsed by hand so a malformed body gets our error shape, not axum's
    let req: LoginRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!(error = %e, "Rejected login body");
        AppError::BadRequest("Invalid request".to_string())
    })?;

    let valid = tokio::time::timeout(
        state.config.store_timeout,
        state.store.validate(&req.username, &req.password),
    )
    .await
    .map_err(|_| AppError::Internal("Credential store timed out".to_string()))??;

    if !valid {
        tracing::debug!(action = "login_failed", "Invalid credentials");
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let claims = Claims::new(
        req.username,
        jsonwebtoken::get_current_timestamp(),
        state.config.token_ttl_secs,
    );
    let token = state.issuer.issue(&claims)?;

    tracing::info!(action = "login_success", sub = %claims.sub, exp = ?claims.exp, "Token issued");

    Ok(Json(TokenResponse { token }))
}

/// GET /validate — Reached only once the token interceptor has passed
pub async fn validate(Extension(claims): Extension<Claims>) -> StatusCode {
    tracing::debug!(sub = %claims.sub, "Token validated");
    StatusCode::OK
}
