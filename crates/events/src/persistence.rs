//! Durable audit trail.
//!
//! [`EventPersistence`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and writes every received [`PlatformEvent`] to `audit_events`. It runs as
//! a long-lived background task and exits when the bus is dropped.

use std::sync::Arc;

use folio_core::types::DbId;
use folio_db::models::audit_event::NewAuditEvent;
use folio_db::{StoreResult, WikiStore};
use tokio::sync::broadcast;

use crate::bus::PlatformEvent;

/// Background service that persists events through the store.
pub struct EventPersistence;

impl EventPersistence {
    /// Run the persistence loop until the channel closes.
    pub async fn run(store: Arc<dyn WikiStore>, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = Self::persist(store.as_ref(), &event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to persist event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Event persistence lagged, some events were not persisted"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, persistence shutting down");
                    break;
                }
            }
        }
    }

    async fn persist(store: &dyn WikiStore, event: &PlatformEvent) -> StoreResult<DbId> {
        store
            .insert_audit_event(&NewAuditEvent {
                event_type: event.event_type.clone(),
                source_entity_type: event.source_entity_type.clone(),
                source_entity_id: event.source_entity_id,
                actor_user_id: event.actor_user_id,
                payload: event.payload.clone(),
                created_at: event.timestamp,
            })
            .await
    }
}
