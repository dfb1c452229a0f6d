//! HTTP-level tests for the `/pages` resource.
//!
//! Drives the router with `tower::ServiceExt::oneshot` over an in-memory
//! store; pages are created through the moderation queue like any client
//! would.

mod common;

use axum::http::{Method, StatusCode};
use common::*;
use folio_core::roles::Role;
use serde_json::json;

// ---------------------------------------------------------------------------
// Page view
// ---------------------------------------------------------------------------

#[tokio::test]
async fn page_resolves_by_slug_and_by_title() {
    let app = build_test_app();
    let alice = editor_token(1, "alice");
    create_page(&app, &alice, "Getting Started", "Welcome").await;

    let response = get(&app, "/api/v1/pages/getting-started", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["title"], "Getting Started");
    assert_eq!(json["data"]["current_revision"], 1);
    assert_eq!(json["data"]["content"], "Welcome");
    assert_eq!(json["data"]["lock"]["is_locked"], false);
    assert_eq!(json["data"]["watchers"], json!([1]));

    let response = get(&app, "/api/v1/pages/Getting%20Started", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["slug"], "getting-started");
}

#[tokio::test]
async fn missing_page_returns_404() {
    let app = build_test_app();
    let response = get(&app, "/api/v1/pages/nowhere", None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[tokio::test]
async fn garbage_token_is_rejected_even_on_public_reads() {
    let app = build_test_app();
    let alice = editor_token(1, "alice");
    create_page(&app, &alice, "Public", "Text").await;

    let response = get(&app, "/api/v1/pages/public", Some("not-a-jwt")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Locks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lock_conflict_reports_holder_and_expiry() {
    let app = build_test_app();
    let alice = editor_token(1, "alice");
    let bob = editor_token(2, "bob");
    create_page(&app, &alice, "Guide", "v1").await;

    let response = send(&app, Method::POST, "/api/v1/pages/guide/lock", Some(&alice), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["is_locked"], true);
    assert_eq!(json["data"]["held_by_caller"], true);
    let expiry = json["data"]["lock_expiry"].clone();

    let response = send(&app, Method::POST, "/api/v1/pages/guide/lock", Some(&bob), None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "LOCK_HELD");
    assert_eq!(json["details"]["locked_by"], "alice");
    assert_eq!(json["details"]["lock_expiry"], expiry);

    // Bob's proposal is refused while the lock stands.
    let response = post_json(
        &app,
        "/api/v1/submissions",
        Some(&bob),
        json!({ "type": "edit", "target_title": "Guide", "content": "v2" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Reads are never blocked.
    let response = get(&app, "/api/v1/pages/guide/lock", Some(&bob)).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["locked_by"], "alice");
    assert_eq!(json["data"]["held_by_caller"], false);
}

#[tokio::test]
async fn renew_and_release_follow_holder_rules() {
    let app = build_test_app();
    let alice = editor_token(1, "alice");
    let bob = editor_token(2, "bob");
    create_page(&app, &alice, "Guide", "v1").await;

    let response = send(&app, Method::PUT, "/api/v1/pages/guide/lock", Some(&alice), None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "NOT_LOCK_HOLDER");

    send(&app, Method::POST, "/api/v1/pages/guide/lock", Some(&alice), None).await;
    let response = send(&app, Method::PUT, "/api/v1/pages/guide/lock", Some(&alice), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, Method::DELETE, "/api/v1/pages/guide/lock", Some(&bob), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        &app,
        Method::DELETE,
        "/api/v1/pages/guide/lock",
        Some(&moderator_token()),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["is_locked"], false);
}

#[tokio::test]
async fn anonymous_callers_cannot_lock() {
    let app = build_test_app();
    let alice = editor_token(1, "alice");
    create_page(&app, &alice, "Guide", "v1").await;

    let response = send(&app, Method::POST, "/api/v1/pages/guide/lock", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get(&app, "/api/v1/pages/guide/lock", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Revisions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn history_detail_and_revert() {
    let app = build_test_app();
    let alice = editor_token(1, "alice");
    create_page(&app, &alice, "Notes", "one").await;
    edit_page(&app, &alice, "Notes", "two").await;
    edit_page(&app, &alice, "Notes", "three").await;

    let response = get(&app, "/api/v1/pages/notes/revisions?sort=oldest&limit=2", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 3);
    let numbers: Vec<i64> = json["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["revision_number"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, vec![1, 2]);

    let response = get(&app, "/api/v1/pages/notes/revisions/2", None).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["revision"]["content"], "two");
    assert_eq!(json["data"]["previous"]["content"], "one");

    let response = post_json(&app, "/api/v1/pages/notes/revert/1", Some(&alice), json!({})).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["revision_number"], 4);
    assert_eq!(json["data"]["edit_type"], "revert");
    assert_eq!(json["data"]["content"], "one");

    let response = get(&app, "/api/v1/pages/notes/revisions?edit_type=revert", None).await;
    assert_eq!(body_json(response).await["data"]["total"], 1);
}

#[tokio::test]
async fn revert_to_missing_revision_is_404() {
    let app = build_test_app();
    let alice = editor_token(1, "alice");
    create_page(&app, &alice, "Notes", "one").await;

    let response = post_json(&app, "/api/v1/pages/notes/revert/9", Some(&alice), json!({})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_edit_type_filter_is_rejected() {
    let app = build_test_app();
    let alice = editor_token(1, "alice");
    create_page(&app, &alice, "Notes", "one").await;

    let response = get(&app, "/api/v1/pages/notes/revisions?edit_type=vandalism", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Protection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn protection_is_moderator_only_and_gates_proposals() {
    let app = build_test_app();
    let alice = editor_token(1, "alice");
    create_page(&app, &alice, "Policy", "v1").await;

    let response = put_json(
        &app,
        "/api/v1/pages/policy/protection",
        Some(&alice),
        json!({ "level": "full" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = put_json(
        &app,
        "/api/v1/pages/policy/protection",
        Some(&moderator_token()),
        json!({ "level": "full", "reason": "edit war" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["level"], "full");
    assert_eq!(json["data"]["protected_by"], "mod");

    let response = get(&app, "/api/v1/pages/policy/protection", None).await;
    assert_eq!(body_json(response).await["data"]["reason"], "edit war");

    let response = post_json(
        &app,
        "/api/v1/submissions",
        Some(&alice),
        json!({ "type": "edit", "target_title": "Policy", "content": "v2" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

#[tokio::test]
async fn move_leaves_redirect_behind() {
    let app = build_test_app();
    let alice = editor_token(1, "alice");
    create_page(&app, &alice, "Old Name", "Body").await;

    let response = post_json(
        &app,
        "/api/v1/pages/old-name/move",
        Some(&alice),
        json!({ "to": "New Name" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json(
        &app,
        "/api/v1/pages/old-name/move",
        Some(&moderator_token()),
        json!({ "to": "New Name", "reason": "clearer" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["to_slug"], "new-name");

    let json = body_json(get(&app, "/api/v1/pages/new-name", None).await).await;
    assert_eq!(json["data"]["content"], "Body");

    let json = body_json(get(&app, "/api/v1/pages/old-name", None).await).await;
    assert_eq!(json["data"]["is_redirect"], true);
    assert_eq!(json["data"]["redirect_target"], "New Name");
    assert_eq!(json["data"]["current_revision"], 2);
}

#[tokio::test]
async fn move_onto_existing_page_conflicts() {
    let app = build_test_app();
    let alice = editor_token(1, "alice");
    create_page(&app, &alice, "Alpha", "a").await;
    create_page(&app, &alice, "Beta", "b").await;

    let response = post_json(
        &app,
        "/api/v1/pages/alpha/move",
        Some(&moderator_token()),
        json!({ "to": "Beta" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Watchlist and discussions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn watch_unwatch_and_watchlist() {
    let app = build_test_app();
    let alice = editor_token(1, "alice");
    let bob = editor_token(2, "bob");
    create_page(&app, &alice, "Topic", "t").await;

    let response = send(&app, Method::POST, "/api/v1/pages/topic/watch", Some(&bob), None).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["watching"], true);
    assert_eq!(json["data"]["changed"], true);

    let response = send(&app, Method::POST, "/api/v1/pages/topic/watch", Some(&bob), None).await;
    assert_eq!(body_json(response).await["data"]["changed"], false);

    let json = body_json(get(&app, "/api/v1/watchlist", Some(&bob)).await).await;
    assert_eq!(json["data"][0]["slug"], "topic");

    let response =
        send(&app, Method::DELETE, "/api/v1/pages/topic/watch", Some(&bob), None).await;
    assert_eq!(body_json(response).await["data"]["watching"], false);

    let json = body_json(get(&app, "/api/v1/watchlist", Some(&bob)).await).await;
    assert_eq!(json["data"], json!([]));

    let response = get(&app, "/api/v1/watchlist", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn discussions_post_and_list() {
    let app = build_test_app();
    let alice = editor_token(1, "alice");
    create_page(&app, &alice, "Topic", "t").await;

    let response = post_json(
        &app,
        "/api/v1/pages/topic/discussions",
        Some(&alice),
        json!({ "body": "Should we split this page?" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(get(&app, "/api/v1/pages/topic/discussions", None).await).await;
    assert_eq!(json["data"][0]["author"], "alice");
    assert_eq!(json["data"][0]["body"], "Should we split this page?");

    let mut banned = actor(3, "troll", Role::Editor);
    banned.is_banned = true;
    let response = post_json(
        &app,
        "/api/v1/pages/topic/discussions",
        Some(&token_for(&banned)),
        json!({ "body": "spam" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
