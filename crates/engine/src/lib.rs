//! Folio wiki engine.
//!
//! [`Engine`] ties the pure rules in `folio-core` to a
//! [`WikiStore`](folio_db::WikiStore): the revision ledger, edit locks, the
//! moderation queue, and the page directory (view, move, protect, watch,
//! discussions). Every mutation goes through the policy evaluator first
//! and lands through one of the store's atomic conditional writes.

pub mod categories;
pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod locks;
pub mod moderation;
pub mod notify;
pub mod rate_limit;
pub mod repair;
pub mod views;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
