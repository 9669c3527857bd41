//! Integration tests for the gauther API.
//!
//! Each test spawns a server on an ephemeral port backed by an in-memory
//! store holding `admin` / `password123`, and talks to it over HTTP.

use gauther::{
    auth::{AppState, Claims, KeyMaterial, TokenIssuer},
    config::Config,
    routes,
    storage::{CredentialHasher, CredentialStore, MemoryStore},
};
use std::sync::Arc;

struct TestServer {
    base_url: String,
    keys: Arc<KeyMaterial>,
}

/// Spin up a test server and return its base URL with the signing key.
async fn spawn_test_server() -> TestServer {
    // Cheap Argon2 parameters keep the tests fast
    let hasher = CredentialHasher::new(1_024, 1, 1, 4).expect("Failed to build hasher");
    let store = MemoryStore::new(hasher);
    store
        .insert_user("admin", "password123")
        .await
        .expect("Failed to add user");

    let keys = Arc::new(KeyMaterial::generate().expect("Failed to generate key"));
    let config = Config {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        ..Config::default()
    };

    let app = routes::api_router(AppState::new(config, keys.clone(), Arc::new(store)));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{}", addr),
        keys,
    }
}

async fn login(
    client: &reqwest::Client,
    base_url: &str,
    username: &str,
    password: &str,
) -> reqwest::Response {
    client
        .post(format!("{}/login", base_url))
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to send request")
}

async fn validate(
    client: &reqwest::Client,
    base_url: &str,
    authorization: Option<&str>,
) -> reqwest::Response {
    let mut req = client.get(format!("{}/validate", base_url));
    if let Some(value) = authorization {
        req = req.header("Authorization", value);
    }
    req.send().await.expect("Failed to send request")
}

async fn error_message(resp: reqwest::Response) -> String {
    let body: serde_json::Value = resp.json().await.unwrap();
    body["error"].as_str().unwrap().to_string()
}

// ============================================================================
// Login Tests
// ============================================================================

#[tokio::test]
async fn test_login_returns_token() {
    let server = spawn_test_server().await;
    let client = reqwest::Client::new();

    let resp = login(&client, &server.base_url, "admin", "password123").await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers().get("cache-control").unwrap(), "no-store");

    let body: serde_json::Value = resp.json().await.unwrap();
    let token = body["token"].as_str().unwrap();
    assert!(!token.is_empty());
}

#[tokio::test]
async fn test_login_wrong_password() {
    let server = spawn_test_server().await;
    let client = reqwest::Client::new();

    let resp = login(&client, &server.base_url, "admin", "wrong").await;
    assert_eq!(resp.status(), 401);
    assert_eq!(error_message(resp).await, "Invalid credentials");
}

#[tokio::test]
async fn test_login_unknown_user() {
    let server = spawn_test_server().await;
    let client = reqwest::Client::new();

    let resp = login(&client, &server.base_url, "ghost", "password123").await;
    assert_eq!(resp.status(), 401);
    assert_eq!(error_message(resp).await, "Invalid credentials");
}

#[tokio::test]
async fn test_login_malformed_body() {
    let server = spawn_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/login", server.base_url))
        .header("Content-Type", "application/json")
        .body("{\"username\":")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(error_message(resp).await, "Invalid request");
}

// ============================================================================
// Validate Tests
// ============================================================================

#[tokio::test]
async fn test_validate_with_issued_token() {
    let server = spawn_test_server().await;
    let client = reqwest::Client::new();

    let resp = login(&client, &server.base_url, "admin", "password123").await;
    let body: serde_json::Value = resp.json().await.unwrap();
    let token = body["token"].as_str().unwrap();

    let resp = validate(&client, &server.base_url, Some(&format!("Bearer {}", token))).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert!(resp.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_validate_without_header() {
    let server = spawn_test_server().await;
    let client = reqwest::Client::new();

    let resp = validate(&client, &server.base_url, None).await;
    assert_eq!(resp.status(), 401);
    assert_eq!(resp.headers().get("cache-control").unwrap(), "no-store");
    assert_eq!(
        error_message(resp).await,
        "Authorization header is missing"
    );
}

#[tokio::test]
async fn test_validate_wrong_scheme() {
    let server = spawn_test_server().await;
    let client = reqwest::Client::new();

    let resp = validate(&client, &server.base_url, Some("Basic YWRtaW46cGFzcw==")).await;
    assert_eq!(resp.status(), 401);
    assert_eq!(
        error_message(resp).await,
        "Invalid Authorization header format"
    );
}

#[tokio::test]
async fn test_validate_expired_token() {
    let server = spawn_test_server().await;
    let client = reqwest::Client::new();

    let now = jsonwebtoken::get_current_timestamp();
    let token = TokenIssuer::new(server.keys.clone())
        .issue(&Claims::new("admin", now - 120, 60))
        .unwrap();

    let resp = validate(&client, &server.base_url, Some(&format!("Bearer {}", token))).await;
    assert_eq!(resp.status(), 401);
    assert_eq!(error_message(resp).await, "Token expired");
}

#[tokio::test]
async fn test_validate_tampered_token() {
    let server = spawn_test_server().await;
    let client = reqwest::Client::new();

    let resp = login(&client, &server.base_url, "admin", "password123").await;
    let body: serde_json::Value = resp.json().await.unwrap();
    let token = body["token"].as_str().unwrap();

    // Swap the payload for one claiming a different subject
    let forged = TokenIssuer::new(Arc::new(KeyMaterial::generate().unwrap()))
        .issue(&Claims::new(
            "root",
            jsonwebtoken::get_current_timestamp(),
            3_600,
        ))
        .unwrap();
    let mut parts: Vec<&str> = token.split('.').collect();
    parts[1] = forged.split('.').nth(1).unwrap();
    let tampered = parts.join(".");

    let resp = validate(&client, &server.base_url, Some(&format!("Bearer {}", tampered))).await;
    assert_eq!(resp.status(), 401);
    assert_eq!(error_message(resp).await, "Invalid token");
}

#[tokio::test]
async fn test_validate_token_from_other_key() {
    let server = spawn_test_server().await;
    let client = reqwest::Client::new();

    let foreign = TokenIssuer::new(Arc::new(KeyMaterial::generate().unwrap()))
        .issue(&Claims::new(
            "admin",
            jsonwebtoken::get_current_timestamp(),
            3_600,
        ))
        .unwrap();

    let resp = validate(&client, &server.base_url, Some(&format!("Bearer {}", foreign))).await;
    assert_eq!(resp.status(), 401);
    assert_eq!(error_message(resp).await, "Invalid token");
}
