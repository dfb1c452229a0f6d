//! Identity and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Requires a valid JWT Bearer token.
//! - [`auth::MaybeAuthUser`] -- Falls back to the anonymous identity when no
//!   token is sent.
//! - [`rbac::RequireModerator`] -- Requires an unbanned moderator or above.

pub mod auth;
pub mod rbac;
