//! Names of the unique constraints the engine reacts to.
//!
//! [`MemoryStore`](crate::memory::MemoryStore) reports violations under the
//! same names as PostgreSQL so callers can match on them uniformly.

pub const PAGES_SLUG: &str = "uq_pages_slug";
pub const PAGES_TITLE: &str = "uq_pages_title";
pub const PAGES_CREATED_FROM_SUBMISSION: &str = "uq_pages_created_from_submission";
pub const PAGES_CREATED_BY_MOVE: &str = "uq_pages_created_by_move";
pub const REVISIONS_SUBMISSION: &str = "uq_revisions_submission";
pub const REVISIONS_MOVE: &str = "uq_revisions_move";
pub const PENDING_MOVES_SOURCE_STARTED: &str = "uq_pending_moves_source_started";
pub const PENDING_MOVES_TO_SLUG_STARTED: &str = "uq_pending_moves_to_slug_started";

/// `true` for constraints that mean "a live page already uses this name".
pub fn is_page_name_clash(constraint: &str) -> bool {
    constraint == PAGES_SLUG || constraint == PAGES_TITLE
}
