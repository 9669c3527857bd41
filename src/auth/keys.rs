//! ECDSA P-384 key material for token signing and verification.
//!
//! A `KeyMaterial` is built once at startup (generated, or loaded from
//! `GAUTHER_PRIVATE_KEY`) and shared by handle with the issuer and verifier.
//! It is read-only afterwards, so concurrent use needs no locking.

use base64::{engine::general_purpose, Engine as _};
use jsonwebtoken::{DecodingKey, EncodingKey};
use p384::elliptic_curve::sec1::ToEncodedPoint;
use p384::pkcs8::der::pem::LineEnding;
use p384::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use p384::{PublicKey, SecretKey};
use rand::{rngs::OsRng, TryRngCore};
use zeroize::Zeroizing;

const PEM_MARKER: &[u8] = b"-----BEGIN";

// P-384 scalar size in bytes
const SCALAR_LEN: usize = 48;

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("Entropy source failure: {0}")]
    Entropy(String),

    #[error("Invalid private key: {0}")]
    Format(String),

    #[error("Key encoding failed: {0}")]
    Encoding(String),
}

/// Signing keypair plus the derived JWT encoding/decoding keys.
pub struct KeyMaterial {
    secret_key: SecretKey,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("secret_key", &"[REDACTED]")
            .field("public_key", &self.public_key_base64())
            .finish()
    }
}

impl KeyMaterial {
    /// Generate a fresh keypair from the OS random source.
    pub fn generate() -> Result<Self, KeyError> {
        let mut scalar = Zeroizing::new([0u8; SCALAR_LEN]);

        // Draws of zero or >= the curve order are rejected and redrawn
        loop {
            OsRng
                .try_fill_bytes(scalar.as_mut_slice())
                .map_err(|e| KeyError::Entropy(e.to_string()))?;

            if let Ok(secret_key) = SecretKey::from_slice(scalar.as_slice()) {
                return Self::from_secret_key(secret_key);
            }
        }
    }

    /// Load a key from base64-encoded PKCS#8 (PEM text or raw DER).
    pub fn load(encoded: &str) -> Result<Self, KeyError> {
        let encoded = encoded.trim();
        if encoded.is_empty() {
            return Err(KeyError::Format("encoded key is empty".to_string()));
        }

        let bytes = Zeroizing::new(
            general_purpose::STANDARD
                .decode(encoded)
                .map_err(|e| KeyError::Format(format!("invalid base64: {}", e)))?,
        );

        let secret_key = if bytes.starts_with(PEM_MARKER) {
            let pem = std::str::from_utf8(&bytes)
                .map_err(|e| KeyError::Format(format!("PEM is not UTF-8: {}", e)))?;
            SecretKey::from_pkcs8_pem(pem)
        } else {
            SecretKey::from_pkcs8_der(&bytes)
        }
        .map_err(|e| KeyError::Format(format!("not a PKCS#8 P-384 key: {}", e)))?;

        Self::from_secret_key(secret_key)
    }

    fn from_secret_key(secret_key: SecretKey) -> Result<Self, KeyError> {
        let der = secret_key
            .to_pkcs8_der()
            .map_err(|e| KeyError::Encoding(e.to_string()))?;
        let encoding_key = EncodingKey::from_ec_der(der.as_bytes());

        let point = secret_key.public_key().to_encoded_point(false);
        let (x, y) = match (point.x(), point.y()) {
            (Some(x), Some(y)) => (x, y),
            _ => return Err(KeyError::Encoding("public key has no coordinates".to_string())),
        };
        let decoding_key = DecodingKey::from_ec_components(
            &general_purpose::URL_SAFE_NO_PAD.encode(x),
            &general_purpose::URL_SAFE_NO_PAD.encode(y),
        )
        .map_err(|e| KeyError::Encoding(e.to_string()))?;

        Ok(KeyMaterial {
            secret_key,
            encoding_key,
            decoding_key,
        })
    }

    /// The verification half of the keypair.
    pub fn public_key(&self) -> PublicKey {
        self.secret_key.public_key()
    }

    /// Uncompressed SEC1 public point, base64.
    pub fn public_key_base64(&self) -> String {
        general_purpose::STANDARD.encode(self.public_key().to_encoded_point(false).as_bytes())
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    /// Export the private key in the format accepted by [`KeyMaterial::load`].
    pub fn to_encoded(&self) -> Result<Zeroizing<String>, KeyError> {
        let pem = self
            .secret_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| KeyError::Encoding(e.to_string()))?;
        Ok(Zeroizing::new(general_purpose::STANDARD.encode(pem.as_bytes())))
    }
}
