#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use folio_core::clock::ManualClock;
use folio_core::moderation::{ReviewAction, SubmissionType};
use folio_core::roles::{Actor, Permissions, Role};
use folio_core::types::{DbId, Timestamp};
use folio_db::models::page::Page;
use folio_db::models::submission::Submission;
use folio_db::{MemoryStore, WikiStore};
use folio_engine::moderation::SubmitRequest;
use folio_engine::notify::{Notification, NotificationSink, NotifyError};
use folio_engine::{Engine, EngineConfig};

pub fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

/// Records every notification; optionally fails each delivery afterwards.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Notification>>,
    fail: bool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn event_types(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|n| n.event_type).collect()
    }

    pub fn last(&self, event_type: &str) -> Option<Notification> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|n| n.event_type == event_type)
            .cloned()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        self.events.lock().unwrap().push(notification);
        if self.fail {
            return Err(NotifyError::Delivery("sink offline".into()));
        }
        Ok(())
    }
}

pub struct Harness {
    pub engine: Engine,
    pub store: Arc<MemoryStore>,
    pub clock: ManualClock,
    pub sink: Arc<RecordingSink>,
}

/// Engine over an empty in-memory store, clock at [`t0`], generous rate limit.
pub fn harness() -> Harness {
    harness_with(
        EngineConfig {
            edit_rate_limit: 1_000,
            ..EngineConfig::default()
        },
        RecordingSink::default(),
    )
}

pub fn harness_with(config: EngineConfig, sink: RecordingSink) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::new(t0());
    let sink = Arc::new(sink);
    let engine = Engine::new(
        Arc::clone(&store) as Arc<dyn WikiStore>,
        Arc::new(clock.clone()),
        Arc::clone(&sink) as Arc<dyn NotificationSink>,
        config,
    );
    Harness {
        engine,
        store,
        clock,
        sink,
    }
}

/// A brand-new account (no edits, created at [`t0`]).
pub fn user(id: DbId, name: &str, role: Role) -> Actor {
    Actor {
        user_id: Some(id),
        username: name.to_string(),
        role,
        permissions: Permissions::for_role(role),
        edits: 0,
        created_at: Some(t0()),
        is_banned: false,
    }
}

pub fn editor(id: DbId, name: &str) -> Actor {
    user(id, name, Role::Editor)
}

pub fn moderator() -> Actor {
    user(900, "mod", Role::Moderator)
}

pub fn create_request(title: &str, content: &str) -> SubmitRequest {
    SubmitRequest {
        submission_type: SubmissionType::Create,
        target_title: title.to_string(),
        target_slug: None,
        namespace: None,
        page_id: None,
        content: content.to_string(),
        summary: None,
        edit_summary: Some("Created page".into()),
        categories: Vec::new(),
        tags: Vec::new(),
        is_minor_edit: false,
    }
}

pub fn edit_request(page: &Page, content: &str) -> SubmitRequest {
    SubmitRequest {
        submission_type: SubmissionType::Edit,
        target_title: page.title.clone(),
        target_slug: Some(page.slug.clone()),
        namespace: None,
        page_id: Some(page.id),
        content: content.to_string(),
        summary: None,
        edit_summary: Some("Update".into()),
        categories: Vec::new(),
        tags: Vec::new(),
        is_minor_edit: false,
    }
}

impl Harness {
    pub async fn page(&self, slug: &str) -> Page {
        self.store.find_page_by_slug(slug).await.unwrap().unwrap()
    }

    /// Submit a creation as `author` and approve it.
    pub async fn create_page(&self, author: &Actor, title: &str, content: &str) -> Page {
        let sub = self
            .engine
            .submit(create_request(title, content), author)
            .await
            .unwrap();
        self.approve(sub.id).await;
        self.store
            .find_page_by_submission(sub.id)
            .await
            .unwrap()
            .unwrap()
    }

    /// Submit an edit as `author` and approve it.
    pub async fn edit_page(&self, author: &Actor, slug: &str, content: &str) -> Page {
        let page = self.page(slug).await;
        let sub = self
            .engine
            .submit(edit_request(&page, content), author)
            .await
            .unwrap();
        self.approve(sub.id).await;
        self.page(slug).await
    }

    pub async fn approve(&self, id: DbId) -> Submission {
        self.engine
            .review(id, ReviewAction::Approve, &moderator(), None)
            .await
            .unwrap()
    }
}

impl Harness {
    pub fn clock_now(&self) -> Timestamp {
        use folio_core::clock::Clock;
        self.clock.now()
    }
}
