//! Authentication primitives.
//!
//! - [`jwt`] -- HS256 access-token generation and validation, and the
//!   mapping from token claims to an engine [`Actor`](folio_core::roles::Actor).

pub mod jwt;
