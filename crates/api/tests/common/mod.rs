#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use notebook_api::auth::jwt::{generate_access_token, JwtConfig};
use notebook_api::config::{ServerConfig, StoreBackend};
use notebook_api::router::build_app_router;
use notebook_api::state::AppState;
use notebook_db::store::{DocumentStore, MemoryDocumentStore};
use serde_json::Value;
use tower::ServiceExt;

pub const OWNER: &str = "user_owner";
pub const STRANGER: &str = "user_stranger";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default),
/// a 30-second request timeout, and a small propagation batch so multi-batch
/// jobs are exercised.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        propagation_batch_size: 2,
        store_backend: StoreBackend::Memory,
        jwt: JwtConfig {
            secret: "test-secret-for-integration-tests".to_string(),
            access_token_expiry_mins: 60,
        },
    }
}

/// Test application plus handles to its internals.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryDocumentStore>,
}

impl TestApp {
    /// Bearer token for `user_id`, signed with the test secret.
    pub fn token(&self, user_id: &str) -> String {
        generate_access_token(user_id, &self.state.config.jwt).unwrap()
    }
}

/// Build the full application router over a fresh in-memory store.
///
/// Uses the same [`build_app_router`] as `main.rs`, so tests exercise the
/// production middleware stack (CORS, request ID, timeout, tracing, panic
/// recovery).
pub fn build_test_app() -> TestApp {
    build_test_app_with(test_config())
}

pub fn build_test_app_with(config: ServerConfig) -> TestApp {
    let store = Arc::new(MemoryDocumentStore::new());
    let dyn_store: Arc<dyn DocumentStore> = store.clone();
    build_test_app_over(store, dyn_store, config)
}

/// Build the application over `serving`, a wrapper around `store`.
///
/// `store` stays reachable on [`TestApp`] for direct inspection.
pub fn build_test_app_over(
    store: Arc<MemoryDocumentStore>,
    serving: Arc<dyn DocumentStore>,
    config: ServerConfig,
) -> TestApp {
    let state = AppState::new(serving, config);
    TestApp {
        router: build_app_router(state.clone()),
        state,
        store,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("authorization", format!("Bearer {}", app.token(user)));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).unwrap())
        }
        None => Body::empty(),
    };
    app.router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

pub async fn get(app: &TestApp, uri: &str, user: Option<&str>) -> Response<Body> {
    send(app, Method::GET, uri, user, None).await
}

pub async fn post(app: &TestApp, uri: &str, user: Option<&str>) -> Response<Body> {
    send(app, Method::POST, uri, user, None).await
}

pub async fn post_json(app: &TestApp, uri: &str, user: Option<&str>, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, user, Some(body)).await
}

pub async fn patch_json(
    app: &TestApp,
    uri: &str,
    user: Option<&str>,
    body: Value,
) -> Response<Body> {
    send(app, Method::PATCH, uri, user, Some(body)).await
}

pub async fn delete(app: &TestApp, uri: &str, user: Option<&str>) -> Response<Body> {
    send(app, Method::DELETE, uri, user, None).await
}

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Create a document through the API and return its id.
pub async fn create_doc(app: &TestApp, user: &str, title: &str, parent: Option<&str>) -> String {
    let response = post_json(
        app,
        "/api/v1/documents",
        Some(user),
        serde_json::json!({ "title": title, "parent_document": parent }),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    let json = body_json(response).await;
    json["data"]["id"].as_str().unwrap().to_string()
}

/// Fetch a document as `user`, returning the `data` object.
pub async fn fetch_doc(app: &TestApp, user: &str, id: &str) -> Value {
    let response = get(app, &format!("/api/v1/documents/{id}"), Some(user)).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    body_json(response).await["data"].clone()
}

/// Ids listed under `data` in a list response.
pub fn ids(json: &Value) -> Vec<String> {
    json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_str().unwrap().to_string())
        .collect()
}
