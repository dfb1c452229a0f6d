//! Revision ledger: append-only history with compare-and-swap commits.

use folio_core::error::CoreError;
use folio_core::policy::{can_override_lock, check_edit};
use folio_core::revision::{
    content_length, revert_summary, size_change, EditType, RevisionQuery,
};
use folio_core::roles::Actor;
use folio_core::types::DbId;
use folio_core::wiki::{parse_redirect, validate_summary};
use folio_db::models::page::Page;
use folio_db::models::revision::{NewRevision, Revision};
use serde_json::json;

use crate::engine::Engine;
use crate::error::EngineResult;
use crate::notify::Notification;
use crate::views::{RevisionDetail, RevisionList};

/// Everything a commit writes besides the bookkeeping the ledger derives.
#[derive(Debug, Clone)]
pub(crate) struct CommitRequest {
    pub content: String,
    pub summary: Option<String>,
    pub author: String,
    pub author_id: Option<DbId>,
    pub edit_type: EditType,
    pub is_minor_edit: bool,
    pub page_summary: Option<String>,
    pub categories: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub submission_id: Option<DbId>,
    pub move_id: Option<DbId>,
}

impl CommitRequest {
    pub fn new(content: String, author: String, author_id: Option<DbId>, edit_type: EditType) -> Self {
        Self {
            content,
            summary: None,
            author,
            author_id,
            edit_type,
            is_minor_edit: false,
            page_summary: None,
            categories: None,
            tags: None,
            submission_id: None,
            move_id: None,
        }
    }
}

impl Engine {
    /// Append a revision to `page` as last read.
    ///
    /// Lands only while the page's `current_revision` is unchanged; a lost
    /// race is a `Conflict`. Content that starts with `#REDIRECT [[X]]`
    /// turns the page into a redirect to `X`, anything else clears it.
    pub(crate) async fn commit(&self, page: &Page, req: CommitRequest) -> EngineResult<Revision> {
        let length = content_length(&req.content);
        let input = NewRevision {
            page_id: page.id,
            expected_revision: page.current_revision,
            size_change: size_change(Some(page.content_length), length),
            content_length: length,
            redirect_target: parse_redirect(&req.content),
            content: req.content,
            summary: req.summary,
            author: req.author,
            author_id: req.author_id,
            edit_type: req.edit_type,
            is_minor_edit: req.is_minor_edit,
            page_summary: req.page_summary,
            categories: req.categories,
            tags: req.tags,
            submission_id: req.submission_id,
            move_id: req.move_id,
            now: self.now(),
        };

        match self.store.commit_revision(&input).await? {
            Some(revision) => {
                tracing::info!(
                    page_id = page.id,
                    slug = %page.slug,
                    revision = revision.revision_number,
                    edit_type = %revision.edit_type,
                    "Revision committed"
                );
                Ok(revision)
            }
            None => {
                tracing::warn!(
                    page_id = page.id,
                    expected = page.current_revision,
                    "Revision commit lost a race"
                );
                Err(CoreError::Conflict(format!(
                    "Page '{}' changed while saving; reload and try again",
                    page.title
                ))
                .into())
            }
        }
    }

    /// Restore revision `target`'s content as a new `revert` revision.
    pub async fn revert(
        &self,
        key: &str,
        target: i32,
        actor: &Actor,
        summary: Option<String>,
    ) -> EngineResult<Revision> {
        let now = self.now();
        let page = self.resolve_page(key).await?;
        check_edit(Some(actor), &page.protection(), now)?;

        let lock = page.lock();
        if lock.is_active(now) && lock.locked_by_id != actor.user_id && !can_override_lock(actor) {
            return Err(CoreError::LockHeld {
                holder: lock.locked_by.unwrap_or_default(),
                holder_id: lock.locked_by_id.unwrap_or_default(),
                expires_at: lock.lock_expiry.unwrap_or(now),
            }
            .into());
        }

        let summary = summary
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| revert_summary(target));
        validate_summary(&summary)?;

        let source = self
            .store
            .find_revision(page.id, target)
            .await?
            .ok_or_else(|| CoreError::not_found("Revision", format!("{}@{target}", page.slug)))?;

        self.take_rate_slot(actor).await?;

        let mut req = CommitRequest::new(
            source.content,
            actor.username.clone(),
            actor.user_id,
            EditType::Revert,
        );
        req.summary = Some(summary);
        let revision = self.commit(&page, req).await?;

        self.emit(
            Notification::page("page.reverted", page.id, now)
                .by(actor.user_id)
                .with_payload(json!({
                    "slug": page.slug,
                    "target": target,
                    "revision": revision.revision_number,
                })),
        )
        .await;
        Ok(revision)
    }

    pub async fn list_revisions(&self, key: &str, query: RevisionQuery) -> EngineResult<RevisionList> {
        let page = self.resolve_page(key).await?;
        let (items, total) = self.store.list_revisions(page.id, &query).await?;
        Ok(RevisionList {
            items,
            total,
            limit: query.limit,
            skip: query.skip,
        })
    }

    pub async fn get_revision_detail(&self, key: &str, number: i32) -> EngineResult<RevisionDetail> {
        let page = self.resolve_page(key).await?;
        let revision = self
            .store
            .find_revision(page.id, number)
            .await?
            .ok_or_else(|| CoreError::not_found("Revision", format!("{}@{number}", page.slug)))?;
        let previous = if number > 1 {
            self.store.find_revision(page.id, number - 1).await?
        } else {
            None
        };
        Ok(RevisionDetail { revision, previous })
    }
}
