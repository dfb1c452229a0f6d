mod common;

use assert_matches::assert_matches;
use chrono::Duration;
use folio_core::error::CoreError;
use folio_core::page_move::MoveState;
use folio_core::policy::{Protection, ProtectionLevel};
use folio_core::revision::{EditType, RevisionQuery};
use folio_core::roles::Role;
use folio_db::models::page::NewPage;
use folio_db::models::pending_move::NewPendingMove;
use folio_db::WikiStore;
use folio_engine::directory::{MoveRequest, ProtectRequest};
use folio_engine::{EngineConfig, EngineError};

use common::*;

fn move_to(to: &str) -> MoveRequest {
    MoveRequest {
        to: to.to_string(),
        reason: Some("rename".into()),
    }
}

fn protect_at(level: ProtectionLevel) -> ProtectRequest {
    ProtectRequest {
        level,
        reason: None,
        protected_until: None,
        allowed_roles: None,
    }
}

// -- views -------------------------------------------------------------------

#[tokio::test]
async fn page_resolves_by_slug_or_title() {
    let h = harness();
    let page = h
        .create_page(&editor(1, "alice"), "Getting Started", "Welcome")
        .await;

    for key in ["getting-started", "Getting Started"] {
        let view = h.engine.get_page(key, None).await.unwrap();
        assert_eq!(view.id, page.id);
        assert_eq!(view.protection.effective_level, ProtectionLevel::None);
        assert!(!view.lock.is_locked);
        assert_eq!(view.watchers, vec![1]);
    }
    assert_matches!(
        h.engine.get_page("missing", None).await,
        Err(EngineError::Core(CoreError::NotFound { entity: "Page", .. }))
    );
}

#[tokio::test]
async fn view_reports_normalized_lock() {
    let h = harness();
    let alice = editor(1, "alice");
    h.create_page(&alice, "Locked", "Text").await;
    h.engine.acquire_lock("locked", &alice).await.unwrap();

    let view = h.engine.get_page("locked", Some(&alice)).await.unwrap();
    assert!(view.lock.is_locked);
    assert!(view.lock.held_by_caller);

    h.clock.advance(Duration::minutes(15));
    let view = h.engine.get_page("locked", Some(&alice)).await.unwrap();
    assert!(!view.lock.is_locked);
}

// -- moves -------------------------------------------------------------------

#[tokio::test]
async fn move_creates_destination_and_redirects_source() {
    let h = harness();
    let alice = editor(1, "alice");
    let source = h.create_page(&alice, "Old Title", "Body text").await;
    h.engine.watch("old-title", &editor(2, "bob")).await.unwrap();
    h.engine
        .protect("old-title", protect_at(ProtectionLevel::Semi), &moderator())
        .await
        .unwrap();

    let outcome = h
        .engine
        .move_page("old-title", move_to("New Title"), &moderator())
        .await
        .unwrap();
    assert_eq!(outcome.source_page_id, source.id);
    assert_eq!(outcome.to_slug, "new-title");

    let dest = h.page("new-title").await;
    assert_eq!(dest.content, "Body text");
    assert_eq!(dest.current_revision, 1);
    assert_eq!(dest.created_by_move, Some(outcome.move_id));
    assert_eq!(dest.protection_level, ProtectionLevel::Semi);
    let mut watchers = h.store.list_watchers(dest.id).await.unwrap();
    watchers.sort();
    assert_eq!(watchers, vec![1, 2]);
    let first = h.store.find_revision(dest.id, 1).await.unwrap().unwrap();
    assert_eq!(first.edit_type, EditType::Move);
    assert_eq!(
        first.summary.as_deref(),
        Some("Moved [[Old Title]] to [[New Title]]: rename")
    );

    let old = h.page("old-title").await;
    assert!(old.is_redirect);
    assert_eq!(old.redirect_target.as_deref(), Some("New Title"));
    assert_eq!(old.content, "#REDIRECT [[New Title]]");
    assert_eq!(old.current_revision, 2);
    let redirect = h.store.find_revision(old.id, 2).await.unwrap().unwrap();
    assert_eq!(redirect.edit_type, EditType::Redirect);
    assert_eq!(redirect.move_id, Some(outcome.move_id));

    let marker = h.store.find_pending_move(outcome.move_id).await.unwrap().unwrap();
    assert_eq!(marker.state, MoveState::Completed);
    assert!(h.sink.event_types().contains(&"page.moved"));
}

#[tokio::test]
async fn move_rules() {
    let h = harness();
    let alice = editor(1, "alice");
    h.create_page(&alice, "Alpha", "A").await;
    h.create_page(&alice, "Beta", "B").await;

    assert_matches!(
        h.engine.move_page("alpha", move_to("Gamma"), &alice).await,
        Err(EngineError::Core(CoreError::Forbidden(_)))
    );
    assert_matches!(
        h.engine.move_page("alpha", move_to("Beta"), &moderator()).await,
        Err(EngineError::Core(CoreError::Conflict(_)))
    );
    assert_matches!(
        h.engine.move_page("alpha", move_to("ALPHA"), &moderator()).await,
        Err(EngineError::Core(CoreError::Validation(_)))
    );
    assert_matches!(
        h.engine.move_page("alpha", move_to("???"), &moderator()).await,
        Err(EngineError::Core(CoreError::Validation(_)))
    );
    assert!(h.store.find_page_by_slug("").await.unwrap().is_none());
    assert_eq!(h.page("alpha").await.current_revision, 1);
}

#[tokio::test]
async fn moving_a_redirect_keeps_destination_a_redirect() {
    let h = harness();
    h.create_page(&editor(1, "alice"), "Shortcut", "#REDIRECT [[Main Page]]")
        .await;

    h.engine
        .move_page("shortcut", move_to("Better Shortcut"), &moderator())
        .await
        .unwrap();

    let dest = h.page("better-shortcut").await;
    assert!(dest.is_redirect);
    assert_eq!(dest.redirect_target.as_deref(), Some("Main Page"));
    let source = h.page("shortcut").await;
    assert_eq!(source.redirect_target.as_deref(), Some("Better Shortcut"));
}

fn marker_for(source_id: i64, to: &str, slug: &str) -> NewPendingMove {
    NewPendingMove {
        source_page_id: source_id,
        from_title: "Stalled".into(),
        to_title: to.into(),
        to_slug: slug.into(),
        actor: "mod".into(),
        actor_id: 900,
        reason: None,
        now: t0(),
    }
}

#[tokio::test]
async fn repair_resumes_stalled_move() {
    let h = harness();
    let source = h.create_page(&editor(1, "alice"), "Stalled", "Body").await;
    let marker = h
        .store
        .insert_pending_move(&marker_for(source.id, "Resumed", "resumed"))
        .await
        .unwrap();

    // Too young to be considered stalled.
    h.clock.advance(Duration::seconds(30));
    assert_eq!(h.engine.repair().await.unwrap().moves_resumed, 0);

    h.clock.advance(Duration::seconds(31));
    let report = h.engine.repair().await.unwrap();
    assert_eq!(report.moves_resumed, 1);

    assert_eq!(h.page("resumed").await.content, "Body");
    assert!(h.page("stalled").await.is_redirect);
    let marker = h.store.find_pending_move(marker.id).await.unwrap().unwrap();
    assert_eq!(marker.state, MoveState::Completed);
}

#[tokio::test]
async fn repair_finishes_half_applied_move_without_duplicating() {
    let h = harness();
    let source = h.create_page(&editor(1, "alice"), "Stalled", "Body").await;
    let marker = h
        .store
        .insert_pending_move(&marker_for(source.id, "Halfway", "halfway"))
        .await
        .unwrap();
    let dest = h
        .store
        .create_page(&NewPage {
            title: "Halfway".into(),
            slug: "halfway".into(),
            namespace: "main".into(),
            content: "Body".into(),
            summary: None,
            categories: Vec::new(),
            tags: Vec::new(),
            redirect_target: None,
            protection: Protection::default(),
            watchers: Vec::new(),
            author: "mod".into(),
            author_id: Some(900),
            edit_summary: None,
            edit_type: EditType::Move,
            is_minor_edit: false,
            created_from_submission: None,
            created_by_move: Some(marker.id),
            now: t0(),
        })
        .await
        .unwrap();

    h.clock.advance(Duration::minutes(2));
    assert_eq!(h.engine.repair().await.unwrap().moves_resumed, 1);

    let resumed = h.page("halfway").await;
    assert_eq!(resumed.id, dest.id);
    assert_eq!(resumed.current_revision, 1);
    let source = h.page("stalled").await;
    assert_eq!(source.redirect_target.as_deref(), Some("Halfway"));
    assert_eq!(source.current_revision, 2);
}

#[tokio::test]
async fn repair_fails_move_whose_destination_was_taken() {
    let h = harness();
    let alice = editor(1, "alice");
    let source = h.create_page(&alice, "Stalled", "Body").await;
    let marker = h
        .store
        .insert_pending_move(&marker_for(source.id, "Squatted", "squatted"))
        .await
        .unwrap();
    h.create_page(&alice, "Squatted", "Unrelated").await;

    h.clock.advance(Duration::minutes(2));
    let report = h.engine.repair().await.unwrap();
    assert_eq!(report.moves_failed, 1);

    let marker = h.store.find_pending_move(marker.id).await.unwrap().unwrap();
    assert_eq!(marker.state, MoveState::Failed);
    assert!(!h.page("stalled").await.is_redirect);
    assert_eq!(h.page("squatted").await.content, "Unrelated");

    // Failed markers are not retried.
    assert_eq!(h.engine.repair().await.unwrap().moves_failed, 0);
}

// -- protection --------------------------------------------------------------

#[tokio::test]
async fn protection_gates_editing() {
    let h = harness();
    let alice = editor(1, "alice");
    let page = h.create_page(&alice, "Gate", "Text").await;

    assert_matches!(
        h.engine
            .protect("gate", protect_at(ProtectionLevel::Full), &alice)
            .await,
        Err(EngineError::Core(CoreError::Forbidden(_)))
    );

    let mut req = protect_at(ProtectionLevel::Semi);
    req.reason = Some("edit war".into());
    let view = h.engine.protect("gate", req, &moderator()).await.unwrap();
    assert_eq!(view.level, ProtectionLevel::Semi);
    assert_eq!(view.protected_by.as_deref(), Some("mod"));
    // Protecting does not touch history.
    assert_eq!(h.page("gate").await.current_revision, 1);

    // Fresh editors are not autoconfirmed.
    assert_matches!(
        h.engine.submit(edit_request(&page, "x"), &alice).await,
        Err(EngineError::Core(CoreError::Forbidden(_)))
    );
    let mut veteran = editor(3, "vet");
    veteran.edits = 25;
    assert!(h.engine.submit(edit_request(&page, "y"), &veteran).await.is_ok());

    // Omitted fields keep their stored values.
    let view = h
        .engine
        .protect("gate", protect_at(ProtectionLevel::Full), &moderator())
        .await
        .unwrap();
    assert_eq!(view.reason.as_deref(), Some("edit war"));
    assert_eq!(
        h.engine.get_protection("gate").await.unwrap().level,
        ProtectionLevel::Full
    );
    assert!(h.sink.event_types().contains(&"page.protected"));
}

#[tokio::test]
async fn timed_protection_lapses() {
    let h = harness();
    let alice = editor(1, "alice");
    let page = h.create_page(&alice, "Timed", "Text").await;

    let mut req = protect_at(ProtectionLevel::Full);
    req.protected_until = Some(t0() - Duration::minutes(1));
    assert_matches!(
        h.engine.protect("timed", req, &moderator()).await,
        Err(EngineError::Core(CoreError::Validation(_)))
    );

    let mut req = protect_at(ProtectionLevel::Full);
    req.protected_until = Some(t0() + Duration::hours(1));
    h.engine.protect("timed", req, &moderator()).await.unwrap();
    assert!(h.engine.submit(edit_request(&page, "x"), &alice).await.is_err());

    h.clock.advance(Duration::hours(2));
    let view = h.engine.get_protection("timed").await.unwrap();
    assert_eq!(view.level, ProtectionLevel::Full);
    assert_eq!(view.effective_level, ProtectionLevel::None);
    assert!(h.engine.submit(edit_request(&page, "x"), &alice).await.is_ok());
}

#[tokio::test]
async fn allowed_roles_open_a_protected_page() {
    let h = harness();
    let alice = editor(1, "alice");
    let page = h.create_page(&alice, "Team", "Text").await;

    let mut req = protect_at(ProtectionLevel::Admin);
    req.allowed_roles = Some(vec![Role::Editor]);
    h.engine.protect("team", req, &moderator()).await.unwrap();

    assert!(h.engine.submit(edit_request(&page, "ok"), &alice).await.is_ok());
    assert_matches!(
        h.engine.submit(edit_request(&page, "no"), &moderator()).await,
        Err(EngineError::Core(CoreError::Forbidden(_)))
    );
}

// -- watchlist and discussions ----------------------------------------------

#[tokio::test]
async fn watchlist_round_trip() {
    let h = harness();
    let alice = editor(1, "alice");
    let bob = editor(2, "bob");
    h.create_page(&alice, "One", "1").await;
    h.create_page(&alice, "Two", "2").await;

    assert!(h.engine.watch("one", &bob).await.unwrap());
    assert!(!h.engine.watch("one", &bob).await.unwrap());
    assert!(h.engine.watch("two", &bob).await.unwrap());

    let watched = h.engine.list_watched(&bob, None, None).await.unwrap();
    let mut slugs: Vec<_> = watched.iter().map(|w| w.slug.as_str()).collect();
    slugs.sort();
    assert_eq!(slugs, vec!["one", "two"]);

    assert!(h.engine.unwatch("one", &bob).await.unwrap());
    assert!(!h.engine.unwatch("one", &bob).await.unwrap());
    assert_eq!(h.engine.list_watched(&bob, None, None).await.unwrap().len(), 1);

    assert_matches!(
        h.engine
            .watch("one", &folio_core::roles::Actor::anonymous(true))
            .await,
        Err(EngineError::Core(CoreError::Unauthorized(_)))
    );
}

#[tokio::test]
async fn discussions_post_and_list() {
    let h = harness();
    let alice = editor(1, "alice");
    h.create_page(&alice, "Talk", "Text").await;

    let posted = h
        .engine
        .post_discussion("talk", &user(4, "viv", Role::Viewer), "Looks good".into())
        .await
        .unwrap();
    assert_eq!(posted.author, "viv");

    assert_matches!(
        h.engine.post_discussion("talk", &alice, "   ".into()).await,
        Err(EngineError::Core(CoreError::Validation(_)))
    );
    let mut banned = editor(5, "troll");
    banned.is_banned = true;
    assert_matches!(
        h.engine.post_discussion("talk", &banned, "spam".into()).await,
        Err(EngineError::Core(CoreError::Forbidden(_)))
    );

    let list = h.engine.list_discussions("talk", None, None).await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].body, "Looks good");
}

// -- ambient -----------------------------------------------------------------

#[tokio::test]
async fn failing_notification_sink_never_fails_operations() {
    let h = harness_with(
        EngineConfig {
            edit_rate_limit: 1_000,
            ..EngineConfig::default()
        },
        RecordingSink::failing(),
    );
    let alice = editor(1, "alice");
    h.create_page(&alice, "Quiet", "v1").await;
    let page = h.edit_page(&alice, "quiet", "v2").await;
    assert_eq!(page.current_revision, 2);
    h.engine
        .move_page("quiet", move_to("Louder"), &moderator())
        .await
        .unwrap();
    assert!(h.sink.event_types().contains(&"page.moved"));
}

#[tokio::test]
async fn edit_actions_are_rate_limited_per_actor() {
    let h = harness_with(
        EngineConfig {
            edit_rate_limit: 2,
            ..EngineConfig::default()
        },
        RecordingSink::default(),
    );
    let alice = editor(1, "alice");
    h.engine.submit(create_request("R1", "x"), &alice).await.unwrap();
    h.engine.submit(create_request("R2", "x"), &alice).await.unwrap();

    h.clock.advance(Duration::seconds(20));
    let err = h
        .engine
        .submit(create_request("R3", "x"), &alice)
        .await
        .unwrap_err();
    assert_matches!(
        err,
        EngineError::Core(CoreError::RateLimited { retry_after_secs: 40 })
    );

    // Other actors have their own window.
    h.engine.submit(create_request("R4", "x"), &editor(2, "bob")).await.unwrap();

    let queued = h
        .engine
        .list_submissions(None, None, None, &moderator())
        .await
        .unwrap();
    assert_eq!(queued.len(), 3);

    h.clock.advance(Duration::seconds(40));
    assert!(h.engine.submit(create_request("R3", "x"), &alice).await.is_ok());
}

#[tokio::test]
async fn revisions_listing_for_moved_page_starts_fresh() {
    let h = harness();
    let alice = editor(1, "alice");
    h.create_page(&alice, "Origin", "v1").await;
    h.edit_page(&alice, "origin", "v2").await;
    h.engine
        .move_page("origin", move_to("Destination"), &moderator())
        .await
        .unwrap();

    let dest = h
        .engine
        .list_revisions("destination", RevisionQuery::default())
        .await
        .unwrap();
    assert_eq!(dest.total, 1);
    let origin = h
        .engine
        .list_revisions("origin", RevisionQuery::default())
        .await
        .unwrap();
    assert_eq!(origin.total, 3);
}
