#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use folio_api::auth::jwt::{generate_access_token, JwtConfig};
use folio_api::config::ServerConfig;
use folio_api::router::build_app_router;
use folio_api::state::AppState;
use folio_core::clock::SystemClock;
use folio_core::roles::{Actor, Permissions, Role};
use folio_db::{MemoryStore, WikiStore};
use folio_engine::notify::BusNotifier;
use folio_engine::Engine;
use folio_events::EventBus;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
        edit_rate_limit: 1_000,
        anonymous_can_edit: false,
        lock_sweep_interval_secs: 60,
    }
}

/// Build the full application router over an in-memory store.
///
/// Uses [`build_app_router`] so tests exercise the same middleware stack
/// (CORS, request ID, timeout, tracing, panic recovery) production uses.
pub fn build_test_app() -> Router {
    build_test_app_with(test_config())
}

pub fn build_test_app_with(config: ServerConfig) -> Router {
    let store: Arc<dyn WikiStore> = Arc::new(MemoryStore::new());
    let bus = Arc::new(EventBus::default());
    let engine = Engine::new(
        store,
        Arc::new(SystemClock),
        Arc::new(BusNotifier::new(bus)),
        config.engine_config(),
    );
    let state = AppState {
        config: Arc::new(config),
        engine,
    };
    build_app_router(state)
}

// ---------------------------------------------------------------------------
// Identities
// ---------------------------------------------------------------------------

pub fn actor(id: i64, name: &str, role: Role) -> Actor {
    Actor {
        user_id: Some(id),
        username: name.to_string(),
        role,
        permissions: Permissions::for_role(role),
        edits: 50,
        created_at: Some(Utc::now() - Duration::days(30)),
        is_banned: false,
    }
}

pub fn token_for(actor: &Actor) -> String {
    generate_access_token(actor, &test_config().jwt).unwrap()
}

pub fn editor_token(id: i64, name: &str) -> String {
    token_for(&actor(id, name, Role::Editor))
}

pub fn moderator_token() -> String {
    token_for(&actor(900, "mod", Role::Moderator))
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
    send(app, Method::GET, uri, token, None).await
}

pub async fn post_json(app: &Router, uri: &str, token: Option<&str>, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, token, Some(body)).await
}

pub async fn put_json(app: &Router, uri: &str, token: Option<&str>, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, token, Some(body)).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Propose a page as `token`'s user and approve it as the moderator.
/// Returns the approved submission.
pub async fn create_page(app: &Router, token: &str, title: &str, content: &str) -> Value {
    let response = post_json(
        app,
        "/api/v1/submissions",
        Some(token),
        serde_json::json!({ "type": "create", "target_title": title, "content": content }),
    )
    .await;
    assert_eq!(response.status(), 201, "submit {title}");
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();
    review(app, id, "approve").await
}

/// Propose an edit to `title` and approve it.
pub async fn edit_page(app: &Router, token: &str, title: &str, content: &str) -> Value {
    let response = post_json(
        app,
        "/api/v1/submissions",
        Some(token),
        serde_json::json!({ "type": "edit", "target_title": title, "content": content }),
    )
    .await;
    assert_eq!(response.status(), 201, "submit edit to {title}");
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();
    review(app, id, "approve").await
}

pub async fn review(app: &Router, id: i64, action: &str) -> Value {
    let response = post_json(
        app,
        &format!("/api/v1/submissions/{id}/review"),
        Some(&moderator_token()),
        serde_json::json!({ "action": action }),
    )
    .await;
    assert_eq!(response.status(), 200, "{action} submission {id}");
    body_json(response).await["data"].clone()
}
