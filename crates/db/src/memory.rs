//! In-process [`WikiStore`] used by tests and database-less local runs.
//!
//! All state sits behind one mutex and every trait method takes it exactly
//! once, so each conditional write is atomic in the same way the matching
//! SQL statement is. Unique violations are reported under the PostgreSQL
//! constraint names from [`crate::constraints`].

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use folio_core::edit_lock::{EditLock, LockFingerprint};
use folio_core::moderation::SubmissionStatus;
use folio_core::page_move::MoveState;
use folio_core::policy::Protection;
use folio_core::rate_limit::RateWindow;
use folio_core::revision::{content_length, RevisionQuery, RevisionSort};
use folio_core::types::{DbId, Timestamp};

use crate::constraints;
use crate::error::{StoreError, StoreResult};
use crate::models::audit_event::{AuditEvent, NewAuditEvent};
use crate::models::discussion::{Discussion, NewDiscussion};
use crate::models::page::{role_names, NewPage, Page};
use crate::models::pending_move::{NewPendingMove, PendingMove};
use crate::models::revision::{NewRevision, Revision, RevisionSummary};
use crate::models::submission::{NewSubmission, ReviewClaim, ReviewRecord, Submission};
use crate::models::watcher::WatchedPage;
use crate::store::WikiStore;

#[derive(Default)]
struct Inner {
    next_id: DbId,
    pages: BTreeMap<DbId, Page>,
    revisions: Vec<Revision>,
    /// `(page_id, user_id, since)`
    watchers: Vec<(DbId, DbId, Timestamp)>,
    discussions: Vec<Discussion>,
    submissions: BTreeMap<DbId, Submission>,
    moves: BTreeMap<DbId, PendingMove>,
    buckets: HashMap<String, RateWindow>,
    audit: Vec<AuditEvent>,
}

impl Inner {
    fn id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    fn live_page_clash(&self, slug: &str, title: &str) -> Option<&'static str> {
        let live = || self.pages.values().filter(|p| !p.is_deleted);
        if live().any(|p| p.slug == slug) {
            return Some(constraints::PAGES_SLUG);
        }
        if live().any(|p| p.title == title) {
            return Some(constraints::PAGES_TITLE);
        }
        None
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn duplicate(constraint: &str) -> StoreError {
    StoreError::Duplicate(constraint.to_string())
}

fn page_filter<'a>(
    revisions: &'a [Revision],
    page_id: DbId,
    q: &'a RevisionQuery,
) -> impl Iterator<Item = &'a Revision> + 'a {
    revisions.iter().filter(move |r| {
        r.page_id == page_id
            && q.author.as_ref().map_or(true, |a| &r.author == a)
            && q.edit_type.map_or(true, |t| r.edit_type == t)
    })
}

fn window<T>(items: impl Iterator<Item = T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .skip(usize::try_from(offset).unwrap_or(0))
        .take(usize::try_from(limit).unwrap_or(0))
        .collect()
}

#[async_trait]
impl WikiStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn find_page_by_id(&self, id: DbId) -> StoreResult<Option<Page>> {
        Ok(self.state().pages.get(&id).cloned())
    }

    async fn find_page_by_slug(&self, slug: &str) -> StoreResult<Option<Page>> {
        Ok(self
            .state()
            .pages
            .values()
            .find(|p| !p.is_deleted && p.slug == slug)
            .cloned())
    }

    async fn find_page_by_title(&self, title: &str) -> StoreResult<Option<Page>> {
        Ok(self
            .state()
            .pages
            .values()
            .find(|p| !p.is_deleted && p.title == title)
            .cloned())
    }

    async fn find_page_by_submission(&self, submission_id: DbId) -> StoreResult<Option<Page>> {
        Ok(self
            .state()
            .pages
            .values()
            .find(|p| p.created_from_submission == Some(submission_id))
            .cloned())
    }

    async fn find_page_by_move(&self, move_id: DbId) -> StoreResult<Option<Page>> {
        Ok(self
            .state()
            .pages
            .values()
            .find(|p| p.created_by_move == Some(move_id))
            .cloned())
    }

    async fn create_page(&self, input: &NewPage) -> StoreResult<Page> {
        let mut state = self.state();

        if let Some(constraint) = state.live_page_clash(&input.slug, &input.title) {
            return Err(duplicate(constraint));
        }
        if input.created_from_submission.is_some()
            && state
                .pages
                .values()
                .any(|p| p.created_from_submission == input.created_from_submission)
        {
            return Err(duplicate(constraints::PAGES_CREATED_FROM_SUBMISSION));
        }
        if input.created_by_move.is_some()
            && state
                .pages
                .values()
                .any(|p| p.created_by_move == input.created_by_move)
        {
            return Err(duplicate(constraints::PAGES_CREATED_BY_MOVE));
        }

        let length = content_length(&input.content);
        let page_id = state.id();
        let mut page = Page {
            id: page_id,
            title: input.title.clone(),
            slug: input.slug.clone(),
            namespace: input.namespace.clone(),
            content: input.content.clone(),
            summary: input.summary.clone(),
            categories: input.categories.clone(),
            tags: input.tags.clone(),
            is_redirect: input.redirect_target.is_some(),
            redirect_target: input.redirect_target.clone(),
            is_deleted: false,
            current_revision: 1,
            content_length: length,
            edits: 1,
            last_editor: input.author.clone(),
            last_editor_id: input.author_id,
            last_edit_date: input.now,
            last_edit_summary: input.edit_summary.clone(),
            protection_level: input.protection.level,
            protection_reason: None,
            protected_by: None,
            protected_by_id: None,
            protected_until: None,
            allowed_roles: role_names(&input.protection.allowed_roles),
            is_locked: false,
            locked_by: None,
            locked_by_id: None,
            lock_start_time: None,
            lock_expiry: None,
            lock_reason: None,
            created_from_submission: input.created_from_submission,
            created_by_move: input.created_by_move,
            created_at: input.now,
            updated_at: input.now,
        };
        page.set_protection(&input.protection);

        let revision_id = state.id();
        state.revisions.push(Revision {
            id: revision_id,
            page_id,
            revision_number: 1,
            content: input.content.clone(),
            summary: input.edit_summary.clone(),
            author: input.author.clone(),
            author_id: input.author_id,
            edit_type: input.edit_type,
            is_minor_edit: input.is_minor_edit,
            content_length: length,
            size_change: 0,
            is_reverted: false,
            is_verified: false,
            submission_id: input.created_from_submission,
            move_id: None,
            created_at: input.now,
        });
        for &user_id in &input.watchers {
            if !state.watchers.iter().any(|&(p, u, _)| p == page_id && u == user_id) {
                state.watchers.push((page_id, user_id, input.now));
            }
        }
        state.pages.insert(page_id, page.clone());
        Ok(page)
    }

    async fn commit_revision(&self, input: &NewRevision) -> StoreResult<Option<Revision>> {
        let mut state = self.state();

        let matches = state.pages.get(&input.page_id).is_some_and(|p| {
            !p.is_deleted && p.current_revision == input.expected_revision
        });
        if !matches {
            return Ok(None);
        }
        if input.submission_id.is_some()
            && state.revisions.iter().any(|r| r.submission_id == input.submission_id)
        {
            return Err(duplicate(constraints::REVISIONS_SUBMISSION));
        }
        if input.move_id.is_some() && state.revisions.iter().any(|r| r.move_id == input.move_id) {
            return Err(duplicate(constraints::REVISIONS_MOVE));
        }

        let revision = Revision {
            id: state.id(),
            page_id: input.page_id,
            revision_number: input.expected_revision + 1,
            content: input.content.clone(),
            summary: input.summary.clone(),
            author: input.author.clone(),
            author_id: input.author_id,
            edit_type: input.edit_type,
            is_minor_edit: input.is_minor_edit,
            content_length: input.content_length,
            size_change: input.size_change,
            is_reverted: false,
            is_verified: false,
            submission_id: input.submission_id,
            move_id: input.move_id,
            created_at: input.now,
        };

        let Some(page) = state.pages.get_mut(&input.page_id) else {
            return Ok(None);
        };
        page.content = input.content.clone();
        page.content_length = input.content_length;
        page.current_revision = revision.revision_number;
        page.edits += 1;
        page.last_editor = input.author.clone();
        page.last_editor_id = input.author_id;
        page.last_edit_date = input.now;
        page.last_edit_summary = input.summary.clone();
        page.is_redirect = input.redirect_target.is_some();
        page.redirect_target = input.redirect_target.clone();
        if let Some(summary) = &input.page_summary {
            page.summary = Some(summary.clone());
        }
        if let Some(categories) = &input.categories {
            page.categories = categories.clone();
        }
        if let Some(tags) = &input.tags {
            page.tags = tags.clone();
        }
        page.updated_at = input.now;

        state.revisions.push(revision.clone());
        Ok(Some(revision))
    }

    async fn swap_lock(
        &self,
        page_id: DbId,
        expected: LockFingerprint,
        lock: &EditLock,
        now: Timestamp,
    ) -> StoreResult<bool> {
        let mut state = self.state();
        let Some(page) = state.pages.get_mut(&page_id) else {
            return Ok(false);
        };
        if page.is_deleted || page.lock().fingerprint() != expected {
            return Ok(false);
        }
        page.set_lock(lock);
        page.updated_at = now;
        Ok(true)
    }

    async fn clear_expired_locks(&self, now: Timestamp) -> StoreResult<u64> {
        let mut state = self.state();
        let mut cleared = 0;
        for page in state.pages.values_mut() {
            if page.is_locked && page.lock_expiry.map_or(true, |expiry| expiry < now) {
                page.set_lock(&EditLock::unlocked());
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    async fn update_protection(
        &self,
        page_id: DbId,
        protection: &Protection,
        now: Timestamp,
    ) -> StoreResult<Option<Page>> {
        let mut state = self.state();
        match state.pages.get_mut(&page_id) {
            Some(page) if !page.is_deleted => {
                page.set_protection(protection);
                page.updated_at = now;
                Ok(Some(page.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn list_revisions(
        &self,
        page_id: DbId,
        query: &RevisionQuery,
    ) -> StoreResult<(Vec<RevisionSummary>, i64)> {
        let state = self.state();
        let mut matching: Vec<&Revision> = page_filter(&state.revisions, page_id, query).collect();
        matching.sort_by_key(|r| r.revision_number);
        if query.sort == RevisionSort::Newest {
            matching.reverse();
        }
        let total = matching.len() as i64;
        let items = window(
            matching.into_iter().map(RevisionSummary::from),
            query.limit,
            query.skip,
        );
        Ok((items, total))
    }

    async fn find_revision(&self, page_id: DbId, number: i32) -> StoreResult<Option<Revision>> {
        Ok(self
            .state()
            .revisions
            .iter()
            .find(|r| r.page_id == page_id && r.revision_number == number)
            .cloned())
    }

    async fn find_revision_by_submission(
        &self,
        submission_id: DbId,
    ) -> StoreResult<Option<Revision>> {
        Ok(self
            .state()
            .revisions
            .iter()
            .find(|r| r.submission_id == Some(submission_id))
            .cloned())
    }

    async fn find_revision_by_move(&self, move_id: DbId) -> StoreResult<Option<Revision>> {
        Ok(self
            .state()
            .revisions
            .iter()
            .find(|r| r.move_id == Some(move_id))
            .cloned())
    }

    async fn add_watcher(&self, page_id: DbId, user_id: DbId, now: Timestamp) -> StoreResult<bool> {
        let mut state = self.state();
        if state.watchers.iter().any(|&(p, u, _)| p == page_id && u == user_id) {
            return Ok(false);
        }
        state.watchers.push((page_id, user_id, now));
        Ok(true)
    }

    async fn remove_watcher(&self, page_id: DbId, user_id: DbId) -> StoreResult<bool> {
        let mut state = self.state();
        let before = state.watchers.len();
        state.watchers.retain(|&(p, u, _)| !(p == page_id && u == user_id));
        Ok(state.watchers.len() < before)
    }

    async fn list_watchers(&self, page_id: DbId) -> StoreResult<Vec<DbId>> {
        Ok(self
            .state()
            .watchers
            .iter()
            .filter(|&&(p, _, _)| p == page_id)
            .map(|&(_, u, _)| u)
            .collect())
    }

    async fn list_watched(
        &self,
        user_id: DbId,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<WatchedPage>> {
        let state = self.state();
        let mut watched: Vec<WatchedPage> = state
            .watchers
            .iter()
            .filter(|&&(_, u, _)| u == user_id)
            .filter_map(|&(page_id, _, since)| {
                let page = state.pages.get(&page_id).filter(|p| !p.is_deleted)?;
                Some(WatchedPage {
                    page_id,
                    title: page.title.clone(),
                    slug: page.slug.clone(),
                    namespace: page.namespace.clone(),
                    current_revision: page.current_revision,
                    last_edit_date: page.last_edit_date,
                    watched_at: since,
                })
            })
            .collect();
        watched.sort_by(|a, b| {
            b.last_edit_date
                .cmp(&a.last_edit_date)
                .then(a.page_id.cmp(&b.page_id))
        });
        Ok(window(watched.into_iter(), limit, offset))
    }

    async fn insert_discussion(&self, input: &NewDiscussion) -> StoreResult<Discussion> {
        let mut state = self.state();
        let discussion = Discussion {
            id: state.id(),
            page_id: input.page_id,
            author: input.author.clone(),
            author_id: input.author_id,
            body: input.body.clone(),
            created_at: input.now,
        };
        state.discussions.push(discussion.clone());
        Ok(discussion)
    }

    async fn list_discussions(
        &self,
        page_id: DbId,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Discussion>> {
        let state = self.state();
        let items = state
            .discussions
            .iter()
            .filter(|d| d.page_id == page_id)
            .cloned();
        Ok(window(items, limit, offset))
    }

    async fn insert_submission(&self, input: &NewSubmission) -> StoreResult<Submission> {
        let mut state = self.state();
        let submission = Submission {
            id: state.id(),
            submission_type: input.submission_type,
            status: SubmissionStatus::Pending,
            target_title: input.target_title.clone(),
            target_slug: input.target_slug.clone(),
            namespace: input.namespace.clone(),
            page_id: input.page_id,
            author: input.author.clone(),
            author_id: input.author_id,
            content: input.content.clone(),
            summary: input.summary.clone(),
            edit_summary: input.edit_summary.clone(),
            categories: input.categories.clone(),
            tags: input.tags.clone(),
            is_minor_edit: input.is_minor_edit,
            reason: None,
            reviewed_by: None,
            reviewer_id: None,
            reviewed_at: None,
            claimed_by: None,
            claimed_at: None,
            created_at: input.now,
            updated_at: input.now,
        };
        state.submissions.insert(submission.id, submission.clone());
        Ok(submission)
    }

    async fn find_submission(&self, id: DbId) -> StoreResult<Option<Submission>> {
        Ok(self.state().submissions.get(&id).cloned())
    }

    async fn list_submissions(
        &self,
        status: Option<SubmissionStatus>,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Submission>> {
        let state = self.state();
        let mut items: Vec<Submission> = state
            .submissions
            .values()
            .filter(|s| status.map_or(true, |wanted| s.status == wanted))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(window(items.into_iter(), limit, offset))
    }

    async fn claim_submission(
        &self,
        id: DbId,
        claimer: DbId,
        now: Timestamp,
        stale_before: Timestamp,
    ) -> StoreResult<Option<Submission>> {
        let mut state = self.state();
        match state.submissions.get_mut(&id) {
            Some(s)
                if s.status.is_reviewable() && !s.has_live_claim(stale_before) =>
            {
                s.claimed_by = Some(claimer);
                s.claimed_at = Some(now);
                s.updated_at = now;
                Ok(Some(s.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn release_submission_claim(&self, id: DbId, claim: &ReviewClaim) -> StoreResult<bool> {
        let mut state = self.state();
        match state.submissions.get_mut(&id) {
            Some(s) if s.review_claim().as_ref() == Some(claim) => {
                s.claimed_by = None;
                s.claimed_at = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn finalize_approval(
        &self,
        id: DbId,
        claim: &ReviewClaim,
        review: &ReviewRecord,
        page_id: Option<DbId>,
    ) -> StoreResult<Option<Submission>> {
        let mut state = self.state();
        match state.submissions.get_mut(&id) {
            Some(s) if s.status.is_reviewable() && s.review_claim().as_ref() == Some(claim) => {
                apply_review(s, review);
                if page_id.is_some() {
                    s.page_id = page_id;
                }
                Ok(Some(s.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn resolve_submission(
        &self,
        id: DbId,
        expected: SubmissionStatus,
        review: &ReviewRecord,
        stale_before: Timestamp,
    ) -> StoreResult<Option<Submission>> {
        let mut state = self.state();
        match state.submissions.get_mut(&id) {
            Some(s) if s.status == expected && !s.has_live_claim(stale_before) => {
                apply_review(s, review);
                Ok(Some(s.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn insert_pending_move(&self, input: &NewPendingMove) -> StoreResult<PendingMove> {
        let mut state = self.state();
        let started = || state.moves.values().filter(|m| m.state == MoveState::Started);
        if started().any(|m| m.source_page_id == input.source_page_id) {
            return Err(duplicate(constraints::PENDING_MOVES_SOURCE_STARTED));
        }
        if started().any(|m| m.to_slug == input.to_slug) {
            return Err(duplicate(constraints::PENDING_MOVES_TO_SLUG_STARTED));
        }
        let pending = PendingMove {
            id: state.id(),
            source_page_id: input.source_page_id,
            from_title: input.from_title.clone(),
            to_title: input.to_title.clone(),
            to_slug: input.to_slug.clone(),
            actor: input.actor.clone(),
            actor_id: input.actor_id,
            reason: input.reason.clone(),
            state: MoveState::Started,
            created_at: input.now,
            completed_at: None,
        };
        state.moves.insert(pending.id, pending.clone());
        Ok(pending)
    }

    async fn find_pending_move(&self, id: DbId) -> StoreResult<Option<PendingMove>> {
        Ok(self.state().moves.get(&id).cloned())
    }

    async fn finish_pending_move(
        &self,
        id: DbId,
        state: MoveState,
        now: Timestamp,
    ) -> StoreResult<bool> {
        let mut inner = self.state();
        match inner.moves.get_mut(&id) {
            Some(m) if m.state == MoveState::Started => {
                m.state = state;
                m.completed_at = Some(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_stalled_moves(&self, before: Timestamp) -> StoreResult<Vec<PendingMove>> {
        Ok(self
            .state()
            .moves
            .values()
            .filter(|m| m.state == MoveState::Started && m.created_at < before)
            .cloned()
            .collect())
    }

    async fn record_rate_hit(&self, actor_key: &str, now: Timestamp) -> StoreResult<RateWindow> {
        let mut state = self.state();
        let current = state.buckets.get(actor_key).copied();
        let next = RateWindow::record(current, now);
        state.buckets.insert(actor_key.to_string(), next);
        Ok(next)
    }

    async fn insert_audit_event(&self, input: &NewAuditEvent) -> StoreResult<DbId> {
        let mut state = self.state();
        let id = state.id();
        state.audit.push(AuditEvent {
            id,
            event_type: input.event_type.clone(),
            source_entity_type: input.source_entity_type.clone(),
            source_entity_id: input.source_entity_id,
            actor_user_id: input.actor_user_id,
            payload: input.payload.clone(),
            created_at: input.created_at,
        });
        Ok(id)
    }

    async fn list_audit_events(&self, limit: i64) -> StoreResult<Vec<AuditEvent>> {
        let state = self.state();
        Ok(window(state.audit.iter().rev().cloned(), limit, 0))
    }
}

fn apply_review(s: &mut Submission, review: &ReviewRecord) {
    s.status = review.status;
    s.reviewed_by = Some(review.reviewed_by.clone());
    s.reviewer_id = Some(review.reviewer_id);
    s.reason = review.reason.clone();
    s.reviewed_at = Some(review.reviewed_at);
    s.claimed_by = None;
    s.claimed_at = None;
    s.updated_at = review.reviewed_at;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
