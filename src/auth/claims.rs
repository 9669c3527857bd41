//! Token claim set.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claims carried inside a token.
///
/// `sub` and `iat` are always present. `exp` is optional on the wire so that
/// tokens without it can be represented when the verifier is configured to
/// accept them; [`Claims::new`] always sets it and the issuer refuses claim
/// sets without one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    /// Application-defined claims
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    pub fn new(sub: impl Into<String>, issued_at: u64, ttl_secs: u64) -> Self {
        Claims {
            sub: sub.into(),
            iat: issued_at,
            exp: Some(issued_at.saturating_add(ttl_secs)),
            extra: Map::new(),
        }
    }

    /// Attach an application-defined claim.
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// `exp` present and strictly after `iat`.
    pub fn has_valid_lifetime(&self) -> bool {
        matches!(self.exp, Some(exp) if exp > self.iat)
    }
}
