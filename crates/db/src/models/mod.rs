//! Row models and insert DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` struct matching the
//! database row and, where the engine inserts rows, a `New*` input struct.

pub mod audit_event;
pub mod discussion;
pub mod page;
pub mod pending_move;
pub mod revision;
pub mod submission;
pub mod watcher;
