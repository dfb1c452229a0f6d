//! Request handlers.
//!
//! Each submodule holds the async handler functions for one resource.
//! Handlers resolve the caller's identity, delegate to the
//! [`Engine`](folio_engine::Engine), and map errors via
//! [`AppError`](crate::error::AppError).

pub mod discussions;
pub mod locks;
pub mod pages;
pub mod revisions;
pub mod submissions;
pub mod watch;
