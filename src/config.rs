use crate::auth::token::ExpiryPolicy;
use crate::storage::password::{
    DEFAULT_ITERATIONS, DEFAULT_MAX_CONCURRENT, DEFAULT_MEMORY_KIB, DEFAULT_PARALLELISM,
};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    // Server
    pub bind_addr: SocketAddr,

    // Signing key (base64 PKCS#8); None generates an ephemeral key
    pub private_key: Option<String>,

    // Account upserted at startup (username, password)
    pub admin_credentials: Option<(String, String)>,

    // Credential store; None uses the in-memory store
    pub redis_url: Option<String>,
    pub store_timeout: Duration,

    // Tokens
    pub token_ttl_secs: u64,
    pub expiry_policy: ExpiryPolicy,

    // Limits
    pub max_body_bytes: usize,

    // Argon2id cost
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
    pub argon2_parallelism: u32,
    pub argon2_max_concurrent: usize,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("private_key", &self.private_key.as_ref().map(|_| "[REDACTED]"))
            .field(
                "admin_credentials",
                &self
                    .admin_credentials
                    .as_ref()
                    .map(|(username, _)| (username, "[REDACTED]")),
            )
            .field("redis_url", &self.redis_url.as_ref().map(|_| "[REDACTED]"))
            .field("store_timeout", &self.store_timeout)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("expiry_policy", &self.expiry_policy)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("argon2_memory_kib", &self.argon2_memory_kib)
            .field("argon2_iterations", &self.argon2_iterations)
            .field("argon2_parallelism", &self.argon2_parallelism)
            .field("argon2_max_concurrent", &self.argon2_max_concurrent)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            private_key: None,
            admin_credentials: None,
            redis_url: None,
            store_timeout: Duration::from_millis(5_000),
            token_ttl_secs: 3_600,
            expiry_policy: ExpiryPolicy::Required,
            max_body_bytes: 16_384,
            argon2_memory_kib: DEFAULT_MEMORY_KIB,
            argon2_iterations: DEFAULT_ITERATIONS,
            argon2_parallelism: DEFAULT_PARALLELISM,
            argon2_max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to parse {0}: {1}")]
    ParseError(String, String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Attempt to load .env file, but don't fail if it doesn't exist
        // (env vars may be set directly in production)
        let _ = dotenvy::dotenv();

        let defaults = Config::default();

        // Server
        let bind_addr = parse_env_or_default("BIND_ADDR", defaults.bind_addr)?;

        // Signing key; set but empty is an error, not a request for a new key
        let private_key = match env::var("GAUTHER_PRIVATE_KEY") {
            Ok(val) if val.trim().is_empty() => {
                return Err(ConfigError::InvalidValue(
                    "GAUTHER_PRIVATE_KEY".to_string(),
                    "is set but empty; unset it to use an ephemeral key".to_string(),
                ))
            }
            Ok(val) => Some(val),
            Err(_) => None,
        };

        // Startup account, both or neither
        let admin_credentials = match (
            non_empty_var("ADMIN_USERNAME"),
            non_empty_var("ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(password)) => Some((username, password)),
            (None, None) => None,
            _ => {
                return Err(ConfigError::InvalidValue(
                    "ADMIN_USERNAME/ADMIN_PASSWORD".to_string(),
                    "must be set together".to_string(),
                ))
            }
        };

        // Credential store
        let redis_url = non_empty_var("REDIS_URL");
        let store_timeout_ms = parse_env_or_default("STORE_TIMEOUT_MS", 5_000u64)?;
        if store_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "STORE_TIMEOUT_MS".to_string(),
                "must be greater than 0".to_string(),
            ));
        }

        // Tokens (exp must be strictly after iat)
        let token_ttl_secs = parse_env_or_default("TOKEN_TTL_SECS", defaults.token_ttl_secs)?;
        if token_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "TOKEN_TTL_SECS".to_string(),
                "must be greater than 0".to_string(),
            ));
        }

        let require_exp = parse_env_or_default("REQUIRE_EXP", true)?;
        let expiry_policy = if require_exp {
            ExpiryPolicy::Required
        } else {
            ExpiryPolicy::Optional
        };

        // Limits
        let max_body_bytes = parse_env_or_default("MAX_BODY_BYTES", defaults.max_body_bytes)?;

        // Argon2id
        let argon2_memory_kib =
            parse_env_or_default("ARGON2_MEMORY_KIB", defaults.argon2_memory_kib)?;
        let argon2_iterations =
            parse_env_or_default("ARGON2_ITERATIONS", defaults.argon2_iterations)?;
        let argon2_parallelism =
            parse_env_or_default("ARGON2_PARALLELISM", defaults.argon2_parallelism)?;
        let argon2_max_concurrent =
            parse_env_or_default("ARGON2_MAX_CONCURRENT", defaults.argon2_max_concurrent)?;
        if argon2_max_concurrent == 0 {
            return Err(ConfigError::InvalidValue(
                "ARGON2_MAX_CONCURRENT".to_string(),
                "must be greater than 0".to_string(),
            ));
        }

        Ok(Config {
            bind_addr,
            private_key,
            admin_credentials,
            redis_url,
            store_timeout: Duration::from_millis(store_timeout_ms),
            token_ttl_secs,
            expiry_policy,
            max_body_bytes,
            argon2_memory_kib,
            argon2_iterations,
            argon2_parallelism,
            argon2_max_concurrent,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Helper function to parse environment variable with a default value
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| ConfigError::ParseError(key.to_string(), format!("{}: {}", e, val))),
        Err(_) => Ok(default),
    }
}
