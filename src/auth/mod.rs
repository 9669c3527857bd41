//! Authentication layer: key material, token issuance and verification, and
//! the interceptor that guards protected endpoints.

pub mod claims;
pub mod keys;
pub mod middleware;
pub mod token;

pub use claims::Claims;
pub use keys::{KeyError, KeyMaterial};
pub use middleware::{authenticate, require_token, AppState};
pub use token::{bearer_token, ExpiryPolicy, Rejection, TokenError, TokenIssuer, TokenVerifier};
