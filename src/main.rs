//! Gauther application entry point.
//!
//! Bootstraps the server:
//! 1. Load configuration from environment
//! 2. Load or generate the signing key
//! 3. Pick the credential store (Redis when configured, else in-memory)
//! 4. Upsert the startup account, if configured
//! 5. Build the router and start the Axum server
//!
//! Also supports `keygen`, `adduser` and `deluser` subcommands.

use gauther::{
    auth::{AppState, KeyMaterial},
    config::Config,
    routes,
    storage::{CredentialHasher, CredentialStore, MemoryStore, RedisStore},
};
use std::sync::Arc;

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  gauther                              Start the server");
    eprintln!("  gauther keygen                       Print a new signing key");
    eprintln!("  gauther adduser <username> <password>");
    eprintln!("  gauther deluser <username>");
    eprintln!();
    eprintln!("Set the keygen output in .env so tokens survive restarts:");
    eprintln!("  GAUTHER_PRIVATE_KEY=<output>");
    eprintln!();
    eprintln!("adduser and deluser operate on the store at REDIS_URL.");
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn hasher(config: &Config) -> CredentialHasher {
    CredentialHasher::new(
        config.argon2_memory_kib,
        config.argon2_iterations,
        config.argon2_parallelism,
        config.argon2_max_concurrent,
    )
    .unwrap_or_else(|e| fail(e))
}

/// Open the Redis store for the user management subcommands.
fn redis_store() -> RedisStore {
    let config = Config::from_env().unwrap_or_else(|e| fail(e));
    let redis_url = config
        .redis_url
        .as_deref()
        .unwrap_or_else(|| fail("REDIS_URL must be set to manage users"));
    RedisStore::open(redis_url, hasher(&config)).unwrap_or_else(|e| fail(e))
}

async fn run_command(args: &[String]) {
    match args {
        [cmd] if cmd == "keygen" => {
            let keys = KeyMaterial::generate().unwrap_or_else(|e| fail(e));
            let encoded = keys.to_encoded().unwrap_or_else(|e| fail(e));
            println!("{}", encoded.as_str());
            eprintln!("Public key: {}", keys.public_key_base64());
        }
        [cmd, username, password] if cmd == "adduser" => {
            redis_store()
                .insert_user(username, password)
                .await
                .unwrap_or_else(|e| fail(e));
            eprintln!("User '{}' saved", username);
        }
        [cmd, username] if cmd == "deluser" => {
            let existed = redis_store()
                .delete_user(username)
                .await
                .unwrap_or_else(|e| fail(e));
            if !existed {
                fail(format!("user '{}' not found", username));
            }
            eprintln!("User '{}' deleted", username);
        }
        _ => {
            print_usage();
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        run_command(&args).await;
        return;
    }

    // Initialize tracing with env filter support (RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config from environment
    let config = Config::from_env().expect("Failed to load config");
    tracing::info!("Starting gauther on {}", config.bind_addr);

    // Signing key
    let keys = match config.private_key.as_deref() {
        Some(encoded) => KeyMaterial::load(encoded).expect("Failed to load GAUTHER_PRIVATE_KEY"),
        None => {
            tracing::warn!("GAUTHER_PRIVATE_KEY not set; tokens will not survive a restart");
            KeyMaterial::generate().expect("Failed to generate signing key")
        }
    };
    tracing::info!(public_key = %keys.public_key_base64(), "Signing key ready");

    // Credential store
    let hasher = hasher(&config);
    let store: Arc<dyn CredentialStore> = match config.redis_url.as_deref() {
        Some(redis_url) => {
            let store = RedisStore::open(redis_url, hasher).expect("Invalid Redis URL");
            tracing::info!("Using Redis credential store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("REDIS_URL not set; using in-memory credential store");
            Arc::new(MemoryStore::new(hasher))
        }
    };

    // Upsert startup account
    if let Some((username, password)) = &config.admin_credentials {
        store
            .insert_user(username, password)
            .await
            .expect("Failed to upsert admin user");
        tracing::info!("Admin user '{}' configured", username);
    }

    let bind_addr = config.bind_addr;
    let state = AppState::new(config, Arc::new(keys), store);
    let app = routes::api_router(state);

    // Bind to configured address
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .expect("Failed to bind");
    tracing::info!("Listening on {}", bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
