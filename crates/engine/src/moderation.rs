//! Moderation queue: proposals wait here until a moderator reviews them.
//!
//! Approval is made single-shot with a short claim on the submission row.
//! The page effect it applies is tagged with the submission id, so an
//! approval interrupted after applying is finished by the next attempt
//! instead of applying twice.

use chrono::Duration;
use folio_core::error::CoreError;
use folio_core::moderation::{
    validate_reason, validate_transition, ReviewAction, SubmissionStatus, SubmissionType,
    REVIEW_CLAIM_TTL_SECS,
};
use folio_core::paging::{clamp_limit, clamp_offset, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use folio_core::policy::{can_review, check_edit, Protection};
use folio_core::revision::EditType;
use folio_core::roles::Actor;
use folio_core::types::{DbId, Timestamp};
use folio_core::wiki::{
    generate_slug, parse_redirect, validate_categories, validate_content, validate_namespace,
    validate_slug, validate_summary, validate_tags, validate_title, NAMESPACE_MAIN,
};
use folio_db::constraints::{
    is_page_name_clash, PAGES_CREATED_FROM_SUBMISSION, REVISIONS_SUBMISSION,
};
use folio_db::models::page::NewPage;
use folio_db::models::submission::{NewSubmission, ReviewRecord, Submission};
use folio_db::StoreError;
use serde::Deserialize;
use serde_json::json;

use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use crate::ledger::CommitRequest;
use crate::notify::Notification;

/// A proposed page creation or edit.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRequest {
    #[serde(rename = "type")]
    pub submission_type: SubmissionType,
    pub target_title: String,
    #[serde(default)]
    pub target_slug: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    /// Page being edited; edits may name it by title instead.
    #[serde(default)]
    pub page_id: Option<DbId>,
    pub content: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub edit_summary: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_minor_edit: bool,
}

fn stale_before(now: Timestamp) -> Timestamp {
    now - Duration::seconds(REVIEW_CLAIM_TTL_SECS)
}

impl Engine {
    /// Queue a proposal as a `pending` submission.
    pub async fn submit(&self, req: SubmitRequest, author: &Actor) -> EngineResult<Submission> {
        let now = self.now();

        validate_title(&req.target_title)?;
        validate_content(&req.content)?;
        validate_tags(&req.tags)?;
        validate_categories(&req.categories)?;
        for summary in [&req.summary, &req.edit_summary].into_iter().flatten() {
            validate_summary(summary)?;
        }

        let mut edited_page = None;
        let (title, slug, namespace) = match req.submission_type {
            SubmissionType::Create => {
                check_edit(Some(author), &Protection::default(), now)?;
                let slug = req
                    .target_slug
                    .clone()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| generate_slug(&req.target_title));
                validate_slug(&slug)?;
                let namespace = req.namespace.clone().unwrap_or_else(|| NAMESPACE_MAIN.to_string());
                validate_namespace(&namespace)?;
                if self.store.find_page_by_slug(&slug).await?.is_some()
                    || self.store.find_page_by_title(&req.target_title).await?.is_some()
                {
                    return Err(duplicate_title(&req.target_title));
                }
                (req.target_title.clone(), slug, namespace)
            }
            SubmissionType::Edit => {
                let page = match req.page_id {
                    Some(id) => self
                        .store
                        .find_page_by_id(id)
                        .await?
                        .filter(|p| !p.is_deleted)
                        .ok_or_else(|| CoreError::not_found("Page", id))?,
                    None => {
                        let key = req.target_slug.as_deref().unwrap_or(&req.target_title);
                        self.resolve_page(key).await?
                    }
                };
                check_edit(Some(author), &page.protection(), now)?;
                let lock = page.lock();
                if lock.is_active(now) && lock.locked_by_id != author.user_id {
                    return Err(CoreError::LockHeld {
                        holder: lock.locked_by.unwrap_or_default(),
                        holder_id: lock.locked_by_id.unwrap_or_default(),
                        expires_at: lock.lock_expiry.unwrap_or(now),
                    }
                    .into());
                }
                let target = (page.title.clone(), page.slug.clone(), page.namespace.clone());
                edited_page = Some(page);
                target
            }
        };

        self.take_rate_slot(author).await?;

        let categories = if req.categories.is_empty() {
            self.categories.extract(&req.content)
        } else {
            req.categories
        };

        let submission = self
            .store
            .insert_submission(&NewSubmission {
                submission_type: req.submission_type,
                target_title: title,
                target_slug: slug,
                namespace,
                page_id: edited_page.as_ref().map(|p| p.id),
                author: author.username.clone(),
                author_id: author.user_id,
                content: req.content,
                summary: req.summary,
                edit_summary: req.edit_summary,
                categories,
                tags: req.tags,
                is_minor_edit: req.is_minor_edit,
                now,
            })
            .await?;

        if let (Some(page), Some(user_id)) = (&edited_page, author.user_id) {
            self.release_own_lock(page, user_id).await;
        }

        tracing::info!(
            submission_id = submission.id,
            kind = %submission.submission_type,
            slug = %submission.target_slug,
            author = %submission.author,
            "Submission queued"
        );
        self.emit(
            Notification::submission("submission.created", submission.id, now)
                .by(author.user_id)
                .with_payload(json!({
                    "type": submission.submission_type,
                    "target_title": submission.target_title,
                    "page_id": submission.page_id,
                })),
        )
        .await;
        Ok(submission)
    }

    /// Approve, reject, or hold a queued submission.
    pub async fn review(
        &self,
        id: DbId,
        action: ReviewAction,
        moderator: &Actor,
        reason: Option<String>,
    ) -> EngineResult<Submission> {
        let reviewer_id = moderator.require_user()?;
        if !can_review(moderator) {
            return Err(CoreError::Forbidden("Only moderators can review submissions".into()).into());
        }
        validate_reason(reason.as_deref())?;

        let submission = self
            .store
            .find_submission(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Submission", id))?;
        validate_transition(id, submission.status, action)?;

        let record = ReviewRecord {
            status: action.target_status(),
            reviewed_by: moderator.username.clone(),
            reviewer_id,
            reason,
            reviewed_at: self.now(),
        };

        let resolved = match action {
            ReviewAction::Approve => self.approve(submission, &record, moderator).await?,
            ReviewAction::Reject | ReviewAction::Hold => {
                let stale = stale_before(record.reviewed_at);
                match self
                    .store
                    .resolve_submission(id, submission.status, &record, stale)
                    .await?
                {
                    Some(s) => s,
                    None => return Err(self.lost_review(id).await),
                }
            }
        };

        tracing::info!(
            submission_id = id,
            status = %resolved.status,
            reviewer = %moderator.username,
            "Submission reviewed"
        );
        self.emit(
            Notification::submission(action.event_type(), id, record.reviewed_at)
                .by(Some(reviewer_id))
                .with_payload(json!({
                    "status": resolved.status,
                    "page_id": resolved.page_id,
                    "author_id": resolved.author_id,
                    "reason": resolved.reason,
                })),
        )
        .await;
        Ok(resolved)
    }

    async fn approve(
        &self,
        submission: Submission,
        record: &ReviewRecord,
        moderator: &Actor,
    ) -> EngineResult<Submission> {
        let id = submission.id;
        let reviewer_id = record.reviewer_id;
        let now = record.reviewed_at;

        let Some(claimed) = self
            .store
            .claim_submission(id, reviewer_id, now, stale_before(now))
            .await?
        else {
            return Err(self.lost_review(id).await);
        };
        let claim = claimed
            .review_claim()
            .ok_or_else(|| CoreError::Internal(format!("claim on submission {id} not recorded")))?;

        let page_id = match self.apply_submission(&claimed, record, moderator).await {
            Ok(page_id) => page_id,
            Err(e) => {
                if let Err(release) = self.store.release_submission_claim(id, &claim).await {
                    tracing::error!(submission_id = id, error = %release, "Failed to release review claim");
                }
                return Err(e);
            }
        };

        match self.store.finalize_approval(id, &claim, record, Some(page_id)).await? {
            Some(done) => Ok(done),
            None => {
                tracing::warn!(submission_id = id, "Review claim lost before finalizing");
                Err(self.lost_review(id).await)
            }
        }
    }

    /// Apply an approved submission's page effect. Returns the page id.
    async fn apply_submission(
        &self,
        sub: &Submission,
        record: &ReviewRecord,
        moderator: &Actor,
    ) -> EngineResult<DbId> {
        match sub.submission_type {
            SubmissionType::Create => self.apply_create(sub, record).await,
            SubmissionType::Edit => self.apply_edit(sub, record, moderator).await,
        }
    }

    async fn apply_create(&self, sub: &Submission, record: &ReviewRecord) -> EngineResult<DbId> {
        if let Some(page) = self.store.find_page_by_submission(sub.id).await? {
            tracing::debug!(submission_id = sub.id, page_id = page.id, "Create already applied");
            return Ok(page.id);
        }

        let input = NewPage {
            title: sub.target_title.clone(),
            slug: sub.target_slug.clone(),
            namespace: sub.namespace.clone(),
            content: sub.content.clone(),
            summary: sub.summary.clone(),
            categories: sub.categories.clone(),
            tags: sub.tags.clone(),
            redirect_target: parse_redirect(&sub.content),
            protection: Protection::default(),
            watchers: sub.author_id.into_iter().collect(),
            author: sub.author.clone(),
            author_id: sub.author_id,
            edit_summary: sub.edit_summary.clone(),
            edit_type: EditType::Create,
            is_minor_edit: sub.is_minor_edit,
            created_from_submission: Some(sub.id),
            created_by_move: None,
            now: record.reviewed_at,
        };

        let page = match self.store.create_page(&input).await {
            Ok(page) => page,
            Err(StoreError::Duplicate(c)) if c == PAGES_CREATED_FROM_SUBMISSION => {
                return self
                    .store
                    .find_page_by_submission(sub.id)
                    .await?
                    .map(|p| p.id)
                    .ok_or_else(|| CoreError::Internal("created page vanished".into()).into());
            }
            Err(StoreError::Duplicate(c)) if is_page_name_clash(&c) => {
                return Err(duplicate_title(&sub.target_title));
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(page_id = page.id, slug = %page.slug, submission_id = sub.id, "Page created");
        self.emit(
            Notification::page("page.created", page.id, record.reviewed_at)
                .by(sub.author_id)
                .with_payload(json!({
                    "slug": page.slug,
                    "title": page.title,
                    "submission_id": sub.id,
                    "approved_by": record.reviewed_by,
                })),
        )
        .await;
        Ok(page.id)
    }

    async fn apply_edit(
        &self,
        sub: &Submission,
        record: &ReviewRecord,
        moderator: &Actor,
    ) -> EngineResult<DbId> {
        if let Some(rev) = self.store.find_revision_by_submission(sub.id).await? {
            tracing::debug!(submission_id = sub.id, page_id = rev.page_id, "Edit already applied");
            return Ok(rev.page_id);
        }

        let page_id = sub
            .page_id
            .ok_or_else(|| CoreError::Validation("Edit submission has no page".into()))?;
        let page = self
            .store
            .find_page_by_id(page_id)
            .await?
            .filter(|p| !p.is_deleted)
            .ok_or_else(|| CoreError::not_found("Page", &sub.target_slug))?;

        // Checked against the page as it is now, not as it was at submit time.
        check_edit(Some(moderator), &page.protection(), record.reviewed_at)?;

        let mut req = CommitRequest::new(
            sub.content.clone(),
            sub.author.clone(),
            sub.author_id,
            EditType::Edit,
        );
        req.summary = sub.edit_summary.clone();
        req.is_minor_edit = sub.is_minor_edit;
        req.page_summary = sub.summary.clone();
        req.categories = (!sub.categories.is_empty()).then(|| sub.categories.clone());
        req.tags = (!sub.tags.is_empty()).then(|| sub.tags.clone());
        req.submission_id = Some(sub.id);

        let revision = match self.commit(&page, req).await {
            Ok(revision) => revision,
            Err(EngineError::Store(StoreError::Duplicate(c))) if c == REVISIONS_SUBMISSION => {
                return Ok(page.id);
            }
            Err(e) => return Err(e),
        };

        self.emit(
            Notification::page("page.edited", page.id, record.reviewed_at)
                .by(sub.author_id)
                .with_payload(json!({
                    "slug": page.slug,
                    "revision": revision.revision_number,
                    "size_change": revision.size_change,
                    "submission_id": sub.id,
                    "approved_by": record.reviewed_by,
                })),
        )
        .await;
        Ok(page.id)
    }

    /// Explain why a conditional review update matched nothing.
    async fn lost_review(&self, id: DbId) -> EngineError {
        match self.store.find_submission(id).await {
            Ok(Some(s)) if s.status.is_terminal() => CoreError::AlreadyResolved {
                id,
                status: s.status.to_string(),
            }
            .into(),
            Ok(Some(_)) => CoreError::Conflict(format!(
                "Submission {id} is already being reviewed"
            ))
            .into(),
            Ok(None) => CoreError::not_found("Submission", id).into(),
            Err(e) => e.into(),
        }
    }

    /// List submissions, newest first. Moderators only.
    pub async fn list_submissions(
        &self,
        status: Option<SubmissionStatus>,
        limit: Option<i64>,
        offset: Option<i64>,
        caller: &Actor,
    ) -> EngineResult<Vec<Submission>> {
        caller.require_user()?;
        if !can_review(caller) {
            return Err(CoreError::Forbidden("Only moderators can browse the queue".into()).into());
        }
        let limit = clamp_limit(limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
        Ok(self
            .store
            .list_submissions(status, limit, clamp_offset(offset))
            .await?)
    }

    /// Fetch one submission. Visible to its author and to moderators.
    pub async fn get_submission(&self, id: DbId, caller: &Actor) -> EngineResult<Submission> {
        let user_id = caller.require_user()?;
        let submission = self
            .store
            .find_submission(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Submission", id))?;
        if submission.author_id != Some(user_id) && !can_review(caller) {
            return Err(CoreError::Forbidden("You cannot view this submission".into()).into());
        }
        Ok(submission)
    }
}

fn duplicate_title(title: &str) -> EngineError {
    CoreError::Conflict(format!("A page titled '{title}' already exists")).into()
}
