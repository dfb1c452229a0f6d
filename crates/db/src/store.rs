//! The storage seam between the engine and a backing database.
//!
//! Every method that mutates shared state is a single atomic conditional
//! operation: it either applies in full or reports that its precondition no
//! longer held (`false` / `None`). Unique-key clashes surface as
//! [`StoreError::Duplicate`] carrying the constraint name.

use async_trait::async_trait;
use folio_core::edit_lock::{EditLock, LockFingerprint};
use folio_core::moderation::SubmissionStatus;
use folio_core::page_move::MoveState;
use folio_core::policy::Protection;
use folio_core::rate_limit::RateWindow;
use folio_core::revision::RevisionQuery;
use folio_core::types::{DbId, Timestamp};

use crate::error::StoreResult;
use crate::models::audit_event::{AuditEvent, NewAuditEvent};
use crate::models::discussion::{Discussion, NewDiscussion};
use crate::models::page::{NewPage, Page};
use crate::models::pending_move::{NewPendingMove, PendingMove};
use crate::models::revision::{NewRevision, Revision, RevisionSummary};
use crate::models::submission::{NewSubmission, ReviewClaim, ReviewRecord, Submission};
use crate::models::watcher::WatchedPage;
use crate::repositories::{
    AuditEventRepo, DiscussionRepo, PageRepo, PendingMoveRepo, RateLimitRepo, RevisionRepo,
    SubmissionRepo, WatcherRepo,
};
use crate::DbPool;

#[async_trait]
pub trait WikiStore: Send + Sync {
    /// Verify the store is reachable.
    async fn ping(&self) -> StoreResult<()>;

    // -- pages ----------------------------------------------------------------

    async fn find_page_by_id(&self, id: DbId) -> StoreResult<Option<Page>>;
    async fn find_page_by_slug(&self, slug: &str) -> StoreResult<Option<Page>>;
    async fn find_page_by_title(&self, title: &str) -> StoreResult<Option<Page>>;
    async fn find_page_by_submission(&self, submission_id: DbId) -> StoreResult<Option<Page>>;
    async fn find_page_by_move(&self, move_id: DbId) -> StoreResult<Option<Page>>;

    /// Insert a page with revision 1 and its initial watchers.
    async fn create_page(&self, input: &NewPage) -> StoreResult<Page>;

    /// Append a revision if the page is still at `expected_revision`.
    async fn commit_revision(&self, input: &NewRevision) -> StoreResult<Option<Revision>>;

    /// Replace the lock if it still matches `expected`.
    async fn swap_lock(
        &self,
        page_id: DbId,
        expected: LockFingerprint,
        lock: &EditLock,
        now: Timestamp,
    ) -> StoreResult<bool>;

    async fn clear_expired_locks(&self, now: Timestamp) -> StoreResult<u64>;

    async fn update_protection(
        &self,
        page_id: DbId,
        protection: &Protection,
        now: Timestamp,
    ) -> StoreResult<Option<Page>>;

    // -- revisions ------------------------------------------------------------

    /// A page of revision metadata plus the total matching count.
    async fn list_revisions(
        &self,
        page_id: DbId,
        query: &RevisionQuery,
    ) -> StoreResult<(Vec<RevisionSummary>, i64)>;

    async fn find_revision(&self, page_id: DbId, number: i32) -> StoreResult<Option<Revision>>;
    async fn find_revision_by_submission(&self, submission_id: DbId)
        -> StoreResult<Option<Revision>>;
    async fn find_revision_by_move(&self, move_id: DbId) -> StoreResult<Option<Revision>>;

    // -- watchers and discussions ---------------------------------------------

    async fn add_watcher(&self, page_id: DbId, user_id: DbId, now: Timestamp) -> StoreResult<bool>;
    async fn remove_watcher(&self, page_id: DbId, user_id: DbId) -> StoreResult<bool>;
    async fn list_watchers(&self, page_id: DbId) -> StoreResult<Vec<DbId>>;
    async fn list_watched(
        &self,
        user_id: DbId,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<WatchedPage>>;

    async fn insert_discussion(&self, input: &NewDiscussion) -> StoreResult<Discussion>;
    async fn list_discussions(
        &self,
        page_id: DbId,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Discussion>>;

    // -- submissions ----------------------------------------------------------

    async fn insert_submission(&self, input: &NewSubmission) -> StoreResult<Submission>;
    async fn find_submission(&self, id: DbId) -> StoreResult<Option<Submission>>;
    async fn list_submissions(
        &self,
        status: Option<SubmissionStatus>,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Submission>>;
    async fn claim_submission(
        &self,
        id: DbId,
        claimer: DbId,
        now: Timestamp,
        stale_before: Timestamp,
    ) -> StoreResult<Option<Submission>>;
    async fn release_submission_claim(&self, id: DbId, claim: &ReviewClaim) -> StoreResult<bool>;
    async fn finalize_approval(
        &self,
        id: DbId,
        claim: &ReviewClaim,
        review: &ReviewRecord,
        page_id: Option<DbId>,
    ) -> StoreResult<Option<Submission>>;
    async fn resolve_submission(
        &self,
        id: DbId,
        expected: SubmissionStatus,
        review: &ReviewRecord,
        stale_before: Timestamp,
    ) -> StoreResult<Option<Submission>>;

    // -- moves ----------------------------------------------------------------

    async fn insert_pending_move(&self, input: &NewPendingMove) -> StoreResult<PendingMove>;
    async fn find_pending_move(&self, id: DbId) -> StoreResult<Option<PendingMove>>;
    async fn finish_pending_move(&self, id: DbId, state: MoveState, now: Timestamp)
        -> StoreResult<bool>;
    async fn list_stalled_moves(&self, before: Timestamp) -> StoreResult<Vec<PendingMove>>;

    // -- rate limits and audit ------------------------------------------------

    async fn record_rate_hit(&self, actor_key: &str, now: Timestamp) -> StoreResult<RateWindow>;

    async fn insert_audit_event(&self, input: &NewAuditEvent) -> StoreResult<DbId>;
    async fn list_audit_events(&self, limit: i64) -> StoreResult<Vec<AuditEvent>>;
}

// ---------------------------------------------------------------------------
// PostgreSQL
// ---------------------------------------------------------------------------

/// [`WikiStore`] backed by PostgreSQL through the repository layer.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl WikiStore for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(crate::health_check(&self.pool).await?)
    }

    async fn find_page_by_id(&self, id: DbId) -> StoreResult<Option<Page>> {
        Ok(PageRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_page_by_slug(&self, slug: &str) -> StoreResult<Option<Page>> {
        Ok(PageRepo::find_by_slug(&self.pool, slug).await?)
    }

    async fn find_page_by_title(&self, title: &str) -> StoreResult<Option<Page>> {
        Ok(PageRepo::find_by_title(&self.pool, title).await?)
    }

    async fn find_page_by_submission(&self, submission_id: DbId) -> StoreResult<Option<Page>> {
        Ok(PageRepo::find_by_submission(&self.pool, submission_id).await?)
    }

    async fn find_page_by_move(&self, move_id: DbId) -> StoreResult<Option<Page>> {
        Ok(PageRepo::find_by_move(&self.pool, move_id).await?)
    }

    async fn create_page(&self, input: &NewPage) -> StoreResult<Page> {
        Ok(PageRepo::create(&self.pool, input).await?)
    }

    async fn commit_revision(&self, input: &NewRevision) -> StoreResult<Option<Revision>> {
        Ok(RevisionRepo::commit(&self.pool, input).await?)
    }

    async fn swap_lock(
        &self,
        page_id: DbId,
        expected: LockFingerprint,
        lock: &EditLock,
        now: Timestamp,
    ) -> StoreResult<bool> {
        Ok(PageRepo::swap_lock(&self.pool, page_id, expected, lock, now).await?)
    }

    async fn clear_expired_locks(&self, now: Timestamp) -> StoreResult<u64> {
        Ok(PageRepo::clear_expired_locks(&self.pool, now).await?)
    }

    async fn update_protection(
        &self,
        page_id: DbId,
        protection: &Protection,
        now: Timestamp,
    ) -> StoreResult<Option<Page>> {
        Ok(PageRepo::update_protection(&self.pool, page_id, protection, now).await?)
    }

    async fn list_revisions(
        &self,
        page_id: DbId,
        query: &RevisionQuery,
    ) -> StoreResult<(Vec<RevisionSummary>, i64)> {
        let items = RevisionRepo::list(&self.pool, page_id, query).await?;
        let total = RevisionRepo::count(&self.pool, page_id, query).await?;
        Ok((items, total))
    }

    async fn find_revision(&self, page_id: DbId, number: i32) -> StoreResult<Option<Revision>> {
        Ok(RevisionRepo::find_by_number(&self.pool, page_id, number).await?)
    }

    async fn find_revision_by_submission(
        &self,
        submission_id: DbId,
    ) -> StoreResult<Option<Revision>> {
        Ok(RevisionRepo::find_by_submission(&self.pool, submission_id).await?)
    }

    async fn find_revision_by_move(&self, move_id: DbId) -> StoreResult<Option<Revision>> {
        Ok(RevisionRepo::find_by_move(&self.pool, move_id).await?)
    }

    async fn add_watcher(&self, page_id: DbId, user_id: DbId, now: Timestamp) -> StoreResult<bool> {
        Ok(WatcherRepo::add(&self.pool, page_id, user_id, now).await?)
    }

    async fn remove_watcher(&self, page_id: DbId, user_id: DbId) -> StoreResult<bool> {
        Ok(WatcherRepo::remove(&self.pool, page_id, user_id).await?)
    }

    async fn list_watchers(&self, page_id: DbId) -> StoreResult<Vec<DbId>> {
        Ok(WatcherRepo::list_for_page(&self.pool, page_id).await?)
    }

    async fn list_watched(
        &self,
        user_id: DbId,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<WatchedPage>> {
        Ok(WatcherRepo::list_for_user(&self.pool, user_id, limit, offset).await?)
    }

    async fn insert_discussion(&self, input: &NewDiscussion) -> StoreResult<Discussion> {
        Ok(DiscussionRepo::create(&self.pool, input).await?)
    }

    async fn list_discussions(
        &self,
        page_id: DbId,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Discussion>> {
        Ok(DiscussionRepo::list_for_page(&self.pool, page_id, limit, offset).await?)
    }

    async fn insert_submission(&self, input: &NewSubmission) -> StoreResult<Submission> {
        Ok(SubmissionRepo::create(&self.pool, input).await?)
    }

    async fn find_submission(&self, id: DbId) -> StoreResult<Option<Submission>> {
        Ok(SubmissionRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_submissions(
        &self,
        status: Option<SubmissionStatus>,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Submission>> {
        Ok(SubmissionRepo::list(&self.pool, status, limit, offset).await?)
    }

    async fn claim_submission(
        &self,
        id: DbId,
        claimer: DbId,
        now: Timestamp,
        stale_before: Timestamp,
    ) -> StoreResult<Option<Submission>> {
        Ok(SubmissionRepo::claim(&self.pool, id, claimer, now, stale_before).await?)
    }

    async fn release_submission_claim(&self, id: DbId, claim: &ReviewClaim) -> StoreResult<bool> {
        Ok(SubmissionRepo::release_claim(&self.pool, id, claim).await?)
    }

    async fn finalize_approval(
        &self,
        id: DbId,
        claim: &ReviewClaim,
        review: &ReviewRecord,
        page_id: Option<DbId>,
    ) -> StoreResult<Option<Submission>> {
        Ok(SubmissionRepo::finalize_approval(&self.pool, id, claim, review, page_id).await?)
    }

    async fn resolve_submission(
        &self,
        id: DbId,
        expected: SubmissionStatus,
        review: &ReviewRecord,
        stale_before: Timestamp,
    ) -> StoreResult<Option<Submission>> {
        Ok(SubmissionRepo::resolve(&self.pool, id, expected, review, stale_before).await?)
    }

    async fn insert_pending_move(&self, input: &NewPendingMove) -> StoreResult<PendingMove> {
        Ok(PendingMoveRepo::create(&self.pool, input).await?)
    }

    async fn find_pending_move(&self, id: DbId) -> StoreResult<Option<PendingMove>> {
        Ok(PendingMoveRepo::find_by_id(&self.pool, id).await?)
    }

    async fn finish_pending_move(
        &self,
        id: DbId,
        state: MoveState,
        now: Timestamp,
    ) -> StoreResult<bool> {
        Ok(PendingMoveRepo::finish(&self.pool, id, state, now).await?)
    }

    async fn list_stalled_moves(&self, before: Timestamp) -> StoreResult<Vec<PendingMove>> {
        Ok(PendingMoveRepo::list_stalled(&self.pool, before).await?)
    }

    async fn record_rate_hit(&self, actor_key: &str, now: Timestamp) -> StoreResult<RateWindow> {
        Ok(RateLimitRepo::hit(&self.pool, actor_key, now).await?)
    }

    async fn insert_audit_event(&self, input: &NewAuditEvent) -> StoreResult<DbId> {
        Ok(AuditEventRepo::insert(&self.pool, input).await?)
    }

    async fn list_audit_events(&self, limit: i64) -> StoreResult<Vec<AuditEvent>> {
        Ok(AuditEventRepo::list_recent(&self.pool, limit).await?)
    }
}
