//! Folio event bus and audit trail.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: the envelope every engine event travels in.
//! - [`EventPersistence`]: background service that writes every event to
//!   the `audit_events` table through the [`WikiStore`](folio_db::WikiStore).

pub mod bus;
pub mod persistence;

pub use bus::{EventBus, PlatformEvent};
pub use persistence::EventPersistence;
