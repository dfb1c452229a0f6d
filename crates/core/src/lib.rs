//! Folio domain core.
//!
//! Pure rules shared by the store, engine, and HTTP layers: the error
//! taxonomy, roles and the policy evaluator, edit-lock and revision
//! bookkeeping, the moderation state machine, and title/slug validation.
//! Nothing in this crate performs I/O.

pub mod clock;
pub mod edit_lock;
pub mod error;
pub mod moderation;
pub mod page_move;
pub mod paging;
pub mod policy;
pub mod rate_limit;
pub mod revision;
pub mod roles;
pub mod types;
pub mod wiki;
