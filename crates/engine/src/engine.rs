use std::sync::Arc;

use folio_core::clock::Clock;
use folio_core::error::CoreError;
use folio_core::roles::Actor;
use folio_core::types::Timestamp;
use folio_core::wiki::generate_slug;
use folio_db::models::page::Page;
use folio_db::WikiStore;

use crate::categories::{CategoryExtractor, WikiLinkCategories};
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::notify::{Notification, NotificationSink};

/// The wiki engine. Cheap to clone; every collaborator is shared.
#[derive(Clone)]
pub struct Engine {
    pub(crate) store: Arc<dyn WikiStore>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) notifier: Arc<dyn NotificationSink>,
    pub(crate) categories: Arc<dyn CategoryExtractor>,
    pub(crate) config: EngineConfig,
}

impl Engine {
    pub fn new(
        store: Arc<dyn WikiStore>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn NotificationSink>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            clock,
            notifier,
            categories: Arc::new(WikiLinkCategories),
            config,
        }
    }

    /// Replace the default `[[Category:...]]` extractor.
    pub fn with_category_extractor(mut self, categories: Arc<dyn CategoryExtractor>) -> Self {
        self.categories = categories;
        self
    }

    pub fn store(&self) -> &Arc<dyn WikiStore> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The identity used for callers without a token.
    pub fn anonymous(&self) -> Actor {
        Actor::anonymous(self.config.anonymous_can_edit)
    }

    pub(crate) fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Deliver a notification. Failures are logged and swallowed.
    pub(crate) async fn emit(&self, notification: Notification) {
        let event_type = notification.event_type;
        let entity_id = notification.entity_id;
        if let Err(e) = self.notifier.notify(notification).await {
            tracing::warn!(error = %e, event_type, entity_id, "Notification sink failed");
        }
    }

    /// Find a live page by slug, by the slug derived from `key` as a title,
    /// or by exact title.
    pub(crate) async fn resolve_page(&self, key: &str) -> EngineResult<Page> {
        if let Some(page) = self.store.find_page_by_slug(key).await? {
            return Ok(page);
        }
        let derived = generate_slug(key);
        if derived != key {
            if let Some(page) = self.store.find_page_by_slug(&derived).await? {
                return Ok(page);
            }
        }
        if let Some(page) = self.store.find_page_by_title(key).await? {
            return Ok(page);
        }
        Err(CoreError::not_found("Page", key).into())
    }
}
