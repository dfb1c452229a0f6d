//! Page directory: views, protection, moves, watchlists, discussions.

use folio_core::error::CoreError;
use folio_core::page_move::{check_distinct_target, move_summary, MoveState};
use folio_core::paging::{clamp_limit, clamp_offset, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use folio_core::policy::{can_move_page, can_protect_page, Protection, ProtectionLevel};
use folio_core::revision::EditType;
use folio_core::roles::{Actor, Role};
use folio_core::types::Timestamp;
use folio_core::wiki::{
    parse_redirect, redirect_content, validate_discussion_body, validate_summary, validate_title,
};
use folio_db::constraints::{
    is_page_name_clash, PAGES_CREATED_BY_MOVE, REVISIONS_MOVE,
};
use folio_db::models::discussion::{Discussion, NewDiscussion};
use folio_db::models::page::{NewPage, Page};
use folio_db::models::pending_move::{NewPendingMove, PendingMove};
use folio_db::models::watcher::WatchedPage;
use folio_db::StoreError;
use serde::Deserialize;
use serde_json::json;

use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use crate::ledger::CommitRequest;
use crate::notify::Notification;
use crate::views::{MoveOutcome, PageView, ProtectionView};

/// Commit attempts for the redirect step before leaving it to repair.
const MAX_REDIRECT_ATTEMPTS: usize = 3;

/// New protection settings. Omitted fields keep their stored values.
#[derive(Debug, Clone, Deserialize)]
pub struct ProtectRequest {
    pub level: ProtectionLevel,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub protected_until: Option<Timestamp>,
    #[serde(default)]
    pub allowed_roles: Option<Vec<Role>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoveRequest {
    pub to: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl Engine {
    // -- views ---------------------------------------------------------------

    pub async fn get_page(&self, key: &str, caller: Option<&Actor>) -> EngineResult<PageView> {
        let page = self.resolve_page(key).await?;
        let watchers = self.store.list_watchers(page.id).await?;
        let caller_id = caller.and_then(|a| a.user_id);
        Ok(PageView::new(page, watchers, caller_id, self.now()))
    }

    // -- protection ----------------------------------------------------------

    pub async fn get_protection(&self, key: &str) -> EngineResult<ProtectionView> {
        let page = self.resolve_page(key).await?;
        Ok(ProtectionView::new(page.protection(), self.now()))
    }

    /// Overwrite a page's protection. Does not create a revision.
    pub async fn protect(
        &self,
        key: &str,
        req: ProtectRequest,
        actor: &Actor,
    ) -> EngineResult<ProtectionView> {
        let user_id = actor.require_user()?;
        if !can_protect_page(actor) {
            return Err(CoreError::Forbidden("You do not have permission to protect pages".into()).into());
        }
        let now = self.now();
        if req.protected_until.is_some_and(|until| until <= now) {
            return Err(CoreError::Validation("protected_until must be in the future".into()).into());
        }
        if let Some(reason) = &req.reason {
            validate_summary(reason)?;
        }

        let page = self.resolve_page(key).await?;
        let current = page.protection();
        let protection = Protection {
            level: req.level,
            reason: req.reason.or(current.reason),
            protected_by: Some(actor.username.clone()),
            protected_by_id: Some(user_id),
            protected_until: req.protected_until.or(current.protected_until),
            allowed_roles: req.allowed_roles.unwrap_or(current.allowed_roles),
        };

        let updated = self
            .store
            .update_protection(page.id, &protection, now)
            .await?
            .ok_or_else(|| CoreError::not_found("Page", key))?;

        tracing::info!(page_id = page.id, level = %protection.level, user_id, "Page protection changed");
        self.emit(
            Notification::page("page.protected", page.id, now)
                .by(Some(user_id))
                .with_payload(json!({
                    "slug": page.slug,
                    "previous_level": current.level,
                    "level": protection.level,
                    "reason": protection.reason,
                    "protected_until": protection.protected_until,
                })),
        )
        .await;
        Ok(ProtectionView::new(updated.protection(), now))
    }

    // -- moves ---------------------------------------------------------------

    /// Rename a page, leaving a redirect at the old title.
    pub async fn move_page(
        &self,
        key: &str,
        req: MoveRequest,
        actor: &Actor,
    ) -> EngineResult<MoveOutcome> {
        let user_id = actor.require_user()?;
        if !can_move_page(actor) {
            return Err(CoreError::Forbidden("Only moderators can move pages".into()).into());
        }
        let to_title = req.to.trim().to_string();
        validate_title(&to_title)?;
        if let Some(reason) = &req.reason {
            validate_summary(reason)?;
        }

        let page = self.resolve_page(key).await?;
        let to_slug = check_distinct_target(&page.slug, &to_title)?;
        if self.store.find_page_by_slug(&to_slug).await?.is_some()
            || self.store.find_page_by_title(&to_title).await?.is_some()
        {
            return Err(destination_exists(&to_title));
        }

        self.take_rate_slot(actor).await?;

        let marker = match self
            .store
            .insert_pending_move(&NewPendingMove {
                source_page_id: page.id,
                from_title: page.title.clone(),
                to_title,
                to_slug,
                actor: actor.username.clone(),
                actor_id: user_id,
                reason: req.reason,
                now: self.now(),
            })
            .await
        {
            Ok(marker) => marker,
            Err(StoreError::Duplicate(_)) => {
                return Err(CoreError::Conflict(
                    "A move involving this page or destination is already in progress".into(),
                )
                .into());
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!(move_id = marker.id, page_id = page.id, to = %marker.to_slug, "Move started");

        self.run_move(&marker).await
    }

    /// Run the remaining steps of a started move. Every step is keyed by
    /// the marker id, so re-running after a partial failure is safe.
    pub(crate) async fn run_move(&self, marker: &PendingMove) -> EngineResult<MoveOutcome> {
        let summary = move_summary(&marker.from_title, &marker.to_title, marker.reason.as_deref());

        let Some(source) = self
            .store
            .find_page_by_id(marker.source_page_id)
            .await?
            .filter(|p| !p.is_deleted)
        else {
            self.finish_move(marker, MoveState::Failed).await?;
            return Err(CoreError::not_found("Page", &marker.from_title).into());
        };

        let destination = match self.store.find_page_by_move(marker.id).await? {
            Some(page) => page,
            None => self.create_move_destination(marker, &source, &summary).await?,
        };

        if self.store.find_revision_by_move(marker.id).await?.is_none() {
            self.commit_move_redirect(marker, &summary).await?;
        }

        self.finish_move(marker, MoveState::Completed).await?;
        let now = self.now();
        tracing::info!(
            move_id = marker.id,
            from = %source.slug,
            to = %destination.slug,
            "Move completed"
        );
        self.emit(
            Notification::page("page.moved", destination.id, now)
                .by(Some(marker.actor_id))
                .with_payload(json!({
                    "move_id": marker.id,
                    "source_page_id": source.id,
                    "from": marker.from_title,
                    "to": marker.to_title,
                    "reason": marker.reason,
                })),
        )
        .await;

        Ok(MoveOutcome {
            move_id: marker.id,
            source_page_id: source.id,
            destination_page_id: destination.id,
            from_title: marker.from_title.clone(),
            to_title: marker.to_title.clone(),
            to_slug: marker.to_slug.clone(),
        })
    }

    async fn create_move_destination(
        &self,
        marker: &PendingMove,
        source: &Page,
        summary: &str,
    ) -> EngineResult<Page> {
        let input = NewPage {
            title: marker.to_title.clone(),
            slug: marker.to_slug.clone(),
            namespace: source.namespace.clone(),
            content: source.content.clone(),
            summary: source.summary.clone(),
            categories: source.categories.clone(),
            tags: source.tags.clone(),
            redirect_target: parse_redirect(&source.content),
            protection: source.protection(),
            watchers: self.store.list_watchers(source.id).await?,
            author: marker.actor.clone(),
            author_id: Some(marker.actor_id),
            edit_summary: Some(summary.to_string()),
            edit_type: EditType::Move,
            is_minor_edit: false,
            created_from_submission: None,
            created_by_move: Some(marker.id),
            now: self.now(),
        };

        match self.store.create_page(&input).await {
            Ok(page) => {
                tracing::debug!(move_id = marker.id, page_id = page.id, "Move destination created");
                Ok(page)
            }
            Err(StoreError::Duplicate(c)) if c == PAGES_CREATED_BY_MOVE => self
                .store
                .find_page_by_move(marker.id)
                .await?
                .ok_or_else(|| CoreError::Internal("move destination vanished".into()).into()),
            Err(StoreError::Duplicate(c)) if is_page_name_clash(&c) => {
                tracing::warn!(move_id = marker.id, to = %marker.to_slug, "Move destination taken");
                self.finish_move(marker, MoveState::Failed).await?;
                Err(destination_exists(&marker.to_title))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn commit_move_redirect(&self, marker: &PendingMove, summary: &str) -> EngineResult<()> {
        for attempt in 1..=MAX_REDIRECT_ATTEMPTS {
            let source = self
                .store
                .find_page_by_id(marker.source_page_id)
                .await?
                .ok_or_else(|| CoreError::not_found("Page", &marker.from_title))?;

            let mut req = CommitRequest::new(
                redirect_content(&marker.to_title),
                marker.actor.clone(),
                Some(marker.actor_id),
                EditType::Redirect,
            );
            req.summary = Some(summary.to_string());
            req.move_id = Some(marker.id);

            match self.commit(&source, req).await {
                Ok(_) => return Ok(()),
                Err(EngineError::Store(StoreError::Duplicate(c))) if c == REVISIONS_MOVE => {
                    return Ok(());
                }
                Err(EngineError::Core(CoreError::Conflict(_))) if attempt < MAX_REDIRECT_ATTEMPTS => {
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
        Err(CoreError::Conflict("Source page kept changing during the move".into()).into())
    }

    async fn finish_move(&self, marker: &PendingMove, state: MoveState) -> EngineResult<()> {
        if !self.store.finish_pending_move(marker.id, state, self.now()).await? {
            tracing::debug!(move_id = marker.id, %state, "Move marker already finished");
        }
        Ok(())
    }

    // -- watchlist -----------------------------------------------------------

    /// Add the caller to the page's watchers. Returns `false` if already watching.
    pub async fn watch(&self, key: &str, actor: &Actor) -> EngineResult<bool> {
        let user_id = actor.require_user()?;
        let page = self.resolve_page(key).await?;
        let added = self.store.add_watcher(page.id, user_id, self.now()).await?;
        tracing::debug!(page_id = page.id, user_id, added, "Watch");
        Ok(added)
    }

    pub async fn unwatch(&self, key: &str, actor: &Actor) -> EngineResult<bool> {
        let user_id = actor.require_user()?;
        let page = self.resolve_page(key).await?;
        let removed = self.store.remove_watcher(page.id, user_id).await?;
        tracing::debug!(page_id = page.id, user_id, removed, "Unwatch");
        Ok(removed)
    }

    pub async fn list_watched(
        &self,
        actor: &Actor,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> EngineResult<Vec<WatchedPage>> {
        let user_id = actor.require_user()?;
        let limit = clamp_limit(limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
        Ok(self
            .store
            .list_watched(user_id, limit, clamp_offset(offset))
            .await?)
    }

    // -- discussions ---------------------------------------------------------

    pub async fn post_discussion(
        &self,
        key: &str,
        actor: &Actor,
        body: String,
    ) -> EngineResult<Discussion> {
        let user_id = actor.require_user()?;
        if actor.is_banned {
            return Err(CoreError::Forbidden("Your account is banned".into()).into());
        }
        validate_discussion_body(&body)?;
        let page = self.resolve_page(key).await?;
        let now = self.now();

        let discussion = self
            .store
            .insert_discussion(&NewDiscussion {
                page_id: page.id,
                author: actor.username.clone(),
                author_id: user_id,
                body,
                now,
            })
            .await?;

        self.emit(
            Notification::page("discussion.posted", page.id, now)
                .by(Some(user_id))
                .with_payload(json!({ "slug": page.slug, "discussion_id": discussion.id })),
        )
        .await;
        Ok(discussion)
    }

    pub async fn list_discussions(
        &self,
        key: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> EngineResult<Vec<Discussion>> {
        let page = self.resolve_page(key).await?;
        let limit = clamp_limit(limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
        Ok(self
            .store
            .list_discussions(page.id, limit, clamp_offset(offset))
            .await?)
    }
}

fn destination_exists(title: &str) -> EngineError {
    CoreError::Conflict(format!("Destination '{title}' already exists")).into()
}
