//! Outbound change notifications.
//!
//! The engine reports every committed change to a [`NotificationSink`].
//! Delivery is best effort: a failing sink is logged and never undoes or
//! fails the operation that produced the notification.

use std::sync::Arc;

use async_trait::async_trait;
use folio_core::types::{DbId, Timestamp};
use folio_events::{EventBus, PlatformEvent};
use serde::Serialize;

/// A committed change, addressed to whoever watches the entity.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub event_type: &'static str,
    pub entity_type: &'static str,
    pub entity_id: DbId,
    pub actor_id: Option<DbId>,
    pub payload: serde_json::Value,
    pub at: Timestamp,
}

impl Notification {
    pub fn page(event_type: &'static str, page_id: DbId, at: Timestamp) -> Self {
        Self::new(event_type, "page", page_id, at)
    }

    pub fn submission(event_type: &'static str, submission_id: DbId, at: Timestamp) -> Self {
        Self::new(event_type, "submission", submission_id, at)
    }

    fn new(event_type: &'static str, entity_type: &'static str, id: DbId, at: Timestamp) -> Self {
        Self {
            event_type,
            entity_type,
            entity_id: id,
            actor_id: None,
            payload: serde_json::Value::Object(Default::default()),
            at,
        }
    }

    pub fn by(mut self, actor_id: Option<DbId>) -> Self {
        self.actor_id = actor_id;
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Publishes notifications onto the in-process [`EventBus`].
pub struct BusNotifier {
    bus: Arc<EventBus>,
}

impl BusNotifier {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl NotificationSink for BusNotifier {
    async fn notify(&self, n: Notification) -> Result<(), NotifyError> {
        let event = PlatformEvent::new(n.event_type)
            .with_source(n.entity_type, n.entity_id)
            .with_actor(n.actor_id)
            .with_payload(n.payload)
            .at(n.at);
        let receivers = self.bus.publish(event);
        tracing::debug!(event_type = n.event_type, receivers, "Notification published");
        Ok(())
    }
}
