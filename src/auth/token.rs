//! Token issuance and verification.
//!
//! Tokens are compact JWS strings signed with ES384 (ECDSA P-384). The issuer is a
//! pure signing primitive: it never fills in `sub`, `iat` or `exp` itself.
//! Verification is a pure function of (token, public key, now).

use super::claims::Claims;
use super::keys::KeyMaterial;
use jsonwebtoken::{Algorithm, Header, Validation};
use std::sync::Arc;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Invalid claims: {0}")]
    InvalidClaims(&'static str),

    #[error("Signing failed: {0}")]
    Signing(String),
}

/// Why a presented token was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("Authorization header is missing")]
    MissingCredential,

    #[error("Invalid Authorization header format")]
    InvalidHeader,

    #[error("Invalid token")]
    MalformedToken,

    #[error("Token expired")]
    Expired,
}

/// How the verifier treats a token without an `exp` claim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExpiryPolicy {
    /// Reject tokens without `exp`.
    #[default]
    Required,
    /// Accept tokens without `exp` as never expiring.
    Optional,
}

/// Signs claim sets with the service key.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    keys: Arc<KeyMaterial>,
}

impl TokenIssuer {
    pub fn new(keys: Arc<KeyMaterial>) -> Self {
        TokenIssuer { keys }
    }

    /// Encode and sign `claims`.
    ///
    /// The claims must already carry `exp` strictly after `iat`.
    pub fn issue(&self, claims: &Claims) -> Result<String, TokenError> {
        if !claims.has_valid_lifetime() {
            return Err(TokenError::InvalidClaims("exp must be after iat"));
        }

        jsonwebtoken::encode(
            &Header::new(Algorithm::ES384),
            claims,
            self.keys.encoding_key(),
        )
        .map_err(|e| TokenError::Signing(e.to_string()))
    }
}

/// Checks token signatures and expiry against the service key.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    keys: Arc<KeyMaterial>,
    expiry: ExpiryPolicy,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(keys: Arc<KeyMaterial>, expiry: ExpiryPolicy) -> Self {
        // Only the signature and algorithm are checked by jsonwebtoken; expiry is
        // evaluated against the caller's clock in `verify`.
        let mut validation = Validation::new(Algorithm::ES384);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        TokenVerifier {
            keys,
            expiry,
            validation,
        }
    }

    /// Verify `token` at time `now` (Unix seconds) and return its claims.
    pub fn verify(&self, token: Option<&str>, now: u64) -> Result<Claims, Rejection> {
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => return Err(Rejection::MissingCredential),
        };

        let data =
            jsonwebtoken::decode::<Claims>(token, self.keys.decoding_key(), &self.validation)
                .map_err(|e| {
                    tracing::debug!(error = %e, "Token failed verification");
                    Rejection::MalformedToken
                })?;

        match (data.claims.exp, self.expiry) {
            (Some(exp), _) if exp > now => Ok(data.claims),
            (Some(_), _) => Err(Rejection::Expired),
            (None, ExpiryPolicy::Optional) => Ok(data.claims),
            (None, ExpiryPolicy::Required) => Err(Rejection::MalformedToken),
        }
    }
}

/// Extract the token from an `Authorization` header value.
///
/// The value must start with the full `Bearer ` prefix; shorter values never
/// match.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value.strip_prefix(BEARER_PREFIX)
}
