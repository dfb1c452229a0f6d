//! HTTP-level tests for the `/submissions` moderation queue.

mod common;

use axum::http::StatusCode;
use common::*;
use folio_core::roles::Role;
use serde_json::json;

fn create_body(title: &str, content: &str) -> serde_json::Value {
    json!({ "type": "create", "target_title": title, "content": content })
}

#[tokio::test]
async fn submit_returns_pending_submission() {
    let app = build_test_app();
    let alice = editor_token(1, "alice");

    let response = post_json(
        &app,
        "/api/v1/submissions",
        Some(&alice),
        json!({
            "type": "create",
            "target_title": "Rust Tips",
            "content": "Use clippy. [[Category:Programming]]",
            "tags": ["rust"],
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "pending");
    assert_eq!(json["data"]["type"], "create");
    assert_eq!(json["data"]["target_slug"], "rust-tips");
    assert_eq!(json["data"]["author"], "alice");
    assert_eq!(json["data"]["categories"], json!(["Programming"]));
    assert!(json["data"].get("claimed_by").is_none());

    // Nothing is published until a moderator approves.
    let response = get(&app, "/api/v1/pages/rust-tips", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn anonymous_submissions_follow_configuration() {
    let app = build_test_app();
    let response = post_json(&app, "/api/v1/submissions", None, create_body("Anon", "x")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let mut config = test_config();
    config.anonymous_can_edit = true;
    let app = build_test_app_with(config);
    let response = post_json(&app, "/api/v1/submissions", None, create_body("Anon", "x")).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["author"], "anonymous");
    assert_eq!(json["data"]["author_id"], serde_json::Value::Null);
}

#[tokio::test]
async fn invalid_proposal_is_400() {
    let app = build_test_app();
    let alice = editor_token(1, "alice");

    let response =
        post_json(&app, "/api/v1/submissions", Some(&alice), create_body("   ", "x")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn queue_is_moderator_only() {
    let app = build_test_app();
    let alice = editor_token(1, "alice");
    post_json(&app, "/api/v1/submissions", Some(&alice), create_body("One", "1")).await;

    let response = get(&app, "/api/v1/submissions", Some(&alice)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get(&app, "/api/v1/submissions", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get(&app, "/api/v1/submissions", Some(&moderator_token())).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn queue_filters_by_status() {
    let app = build_test_app();
    let alice = editor_token(1, "alice");
    create_page(&app, &alice, "Done", "d").await;
    post_json(&app, "/api/v1/submissions", Some(&alice), create_body("Waiting", "w")).await;

    let response = get(&app, "/api/v1/submissions?status=pending", Some(&moderator_token())).await;
    let json = body_json(response).await;
    let items = json["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["target_title"], "Waiting");

    let response =
        get(&app, "/api/v1/submissions?status=approved", Some(&moderator_token())).await;
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["target_title"], "Done");
    assert_eq!(json["data"][0]["reviewed_by"], "mod");
}

#[tokio::test]
async fn submission_is_visible_to_author_and_moderators_only() {
    let app = build_test_app();
    let alice = editor_token(1, "alice");
    let bob = editor_token(2, "bob");
    let response =
        post_json(&app, "/api/v1/submissions", Some(&alice), create_body("Mine", "m")).await;
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();
    let uri = format!("/api/v1/submissions/{id}");

    assert_eq!(get(&app, &uri, Some(&alice)).await.status(), StatusCode::OK);
    assert_eq!(get(&app, &uri, Some(&moderator_token())).await.status(), StatusCode::OK);
    assert_eq!(get(&app, &uri, Some(&bob)).await.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        get(&app, "/api/v1/submissions/9999", Some(&alice)).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn second_review_reports_already_resolved() {
    let app = build_test_app();
    let alice = editor_token(1, "alice");
    let response =
        post_json(&app, "/api/v1/submissions", Some(&alice), create_body("Once", "o")).await;
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let approved = review(&app, id, "approve").await;
    assert_eq!(approved["status"], "approved");

    let response = post_json(
        &app,
        &format!("/api/v1/submissions/{id}/review"),
        Some(&moderator_token()),
        json!({ "action": "reject", "reason": "too late" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "ALREADY_RESOLVED");
    assert_eq!(json["details"]["status"], "approved");
}

#[tokio::test]
async fn hold_then_reject() {
    let app = build_test_app();
    let alice = editor_token(1, "alice");
    let response =
        post_json(&app, "/api/v1/submissions", Some(&alice), create_body("Maybe", "m")).await;
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let held = review(&app, id, "hold").await;
    assert_eq!(held["status"], "onhold");

    let response = post_json(
        &app,
        &format!("/api/v1/submissions/{id}/review"),
        Some(&moderator_token()),
        json!({ "action": "hold" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let rejected = review(&app, id, "reject").await;
    assert_eq!(rejected["status"], "rejected");
    let response = get(&app, "/api/v1/pages/maybe", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn editors_cannot_review() {
    let app = build_test_app();
    let alice = editor_token(1, "alice");
    let response =
        post_json(&app, "/api/v1/submissions", Some(&alice), create_body("Self", "s")).await;
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = post_json(
        &app,
        &format!("/api/v1/submissions/{id}/review"),
        Some(&alice),
        json!({ "action": "approve" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let mut banned_mod = actor(901, "fallen", Role::Moderator);
    banned_mod.is_banned = true;
    let response = post_json(
        &app,
        &format!("/api/v1/submissions/{id}/review"),
        Some(&token_for(&banned_mod)),
        json!({ "action": "approve" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn approved_edit_appends_revision() {
    let app = build_test_app();
    let alice = editor_token(1, "alice");
    let bob = editor_token(2, "bob");
    create_page(&app, &alice, "Shared", "first").await;
    edit_page(&app, &bob, "Shared", "second, longer").await;

    let json = body_json(get(&app, "/api/v1/pages/shared", None).await).await;
    assert_eq!(json["data"]["current_revision"], 2);
    assert_eq!(json["data"]["last_editor"], "bob");
    assert_eq!(json["data"]["content"], "second, longer");
}

#[tokio::test]
async fn rate_limit_returns_429() {
    let mut config = test_config();
    config.edit_rate_limit = 2;
    let app = build_test_app_with(config);
    let alice = editor_token(1, "alice");

    for title in ["A", "B"] {
        let response =
            post_json(&app, "/api/v1/submissions", Some(&alice), create_body(title, "x")).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }
    let response =
        post_json(&app, "/api/v1/submissions", Some(&alice), create_body("C", "x")).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("retry-after"));
}
