//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod audit_event_repo;
pub mod discussion_repo;
pub mod page_repo;
pub mod pending_move_repo;
pub mod rate_limit_repo;
pub mod revision_repo;
pub mod submission_repo;
pub mod watcher_repo;

pub use audit_event_repo::AuditEventRepo;
pub use discussion_repo::DiscussionRepo;
pub use page_repo::PageRepo;
pub use pending_move_repo::PendingMoveRepo;
pub use rate_limit_repo::RateLimitRepo;
pub use revision_repo::RevisionRepo;
pub use submission_repo::SubmissionRepo;
pub use watcher_repo::WatcherRepo;
