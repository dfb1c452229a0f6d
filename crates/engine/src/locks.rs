//! Edit locks: advisory, time-bounded claims on a page.
//!
//! Every write is a compare-and-swap against the lock as last read. When
//! the swap loses, the page is re-read and the plan re-evaluated, so a
//! losing acquirer ends up seeing the winner's lock and gets `LockHeld`.

use folio_core::edit_lock::{
    lock_status, plan_acquire, plan_release, plan_renew, EditLock, LockStatus, ReleasePlan,
};
use folio_core::error::CoreError;
use folio_core::policy::check_edit;
use folio_core::roles::Actor;
use folio_core::types::{DbId, Timestamp};
use folio_db::models::page::Page;
use serde_json::json;

use crate::engine::Engine;
use crate::error::EngineResult;
use crate::notify::Notification;

/// Re-read attempts after a lost compare-and-swap.
const MAX_LOCK_ATTEMPTS: usize = 3;

impl Engine {
    pub async fn lock_status(&self, key: &str, caller: Option<&Actor>) -> EngineResult<LockStatus> {
        let page = self.resolve_page(key).await?;
        let caller_id = caller.and_then(|a| a.user_id);
        Ok(lock_status(&page.lock(), caller_id, self.now()))
    }

    /// Take (or refresh) the edit lock for `actor`.
    pub async fn acquire_lock(&self, key: &str, actor: &Actor) -> EngineResult<LockStatus> {
        let user_id = actor.require_user()?;
        let probe = self.resolve_page(key).await?;
        check_edit(Some(actor), &probe.protection(), self.now())?;

        let (page, lock) = self
            .swap_lock_with(key, |current, now| {
                plan_acquire(current, user_id, &actor.username, now).map(Some)
            })
            .await?;
        let now = self.now();
        let status = lock_status(&lock, Some(user_id), now);

        tracing::info!(page_id = page.id, user_id, expires = ?status.lock_expiry, "Edit lock acquired");
        self.emit(
            Notification::page("page.locked", page.id, now)
                .by(Some(user_id))
                .with_payload(json!({ "slug": page.slug, "lock_expiry": status.lock_expiry })),
        )
        .await;
        Ok(status)
    }

    /// Extend the caller's active lock to a full TTL from now.
    pub async fn renew_lock(&self, key: &str, actor: &Actor) -> EngineResult<LockStatus> {
        let user_id = actor.require_user()?;
        let (page, lock) = self
            .swap_lock_with(key, |current, now| plan_renew(current, user_id, now).map(Some))
            .await?;
        let status = lock_status(&lock, Some(user_id), self.now());
        tracing::info!(page_id = page.id, user_id, expires = ?status.lock_expiry, "Edit lock renewed");
        Ok(status)
    }

    /// Clear the lock. Holder or moderator; a no-op when nothing is stored.
    pub async fn release_lock(&self, key: &str, actor: &Actor) -> EngineResult<LockStatus> {
        let user_id = actor.require_user()?;
        let mut cleared = false;
        let (page, lock) = self
            .swap_lock_with(key, |current, now| match plan_release(current, actor, now)? {
                ReleasePlan::Clear => {
                    cleared = true;
                    Ok(Some(EditLock::unlocked()))
                }
                ReleasePlan::AlreadyUnlocked => {
                    cleared = false;
                    Ok(None)
                }
            })
            .await?;
        let now = self.now();

        if cleared {
            tracing::info!(page_id = page.id, user_id, "Edit lock released");
            self.emit(
                Notification::page("page.unlocked", page.id, now)
                    .by(Some(user_id))
                    .with_payload(json!({ "slug": page.slug })),
            )
            .await;
        } else {
            tracing::debug!(page_id = page.id, user_id, "Release on unlocked page");
        }
        Ok(lock_status(&lock, Some(user_id), now))
    }

    /// Drop `user_id`'s own active lock on `page`, logging any failure.
    pub(crate) async fn release_own_lock(&self, page: &Page, user_id: DbId) {
        let current = page.lock();
        if !current.held_by(user_id, self.now()) {
            return;
        }
        match self
            .store
            .swap_lock(page.id, current.fingerprint(), &EditLock::unlocked(), self.now())
            .await
        {
            Ok(true) => tracing::debug!(page_id = page.id, user_id, "Released author's lock"),
            Ok(false) => tracing::debug!(page_id = page.id, user_id, "Author's lock already changed"),
            Err(e) => tracing::warn!(page_id = page.id, user_id, error = %e, "Failed to release author's lock"),
        }
    }

    /// Apply `plan` to the page's lock with compare-and-swap, re-reading
    /// and re-planning after a lost swap.
    ///
    /// `plan` returns the replacement lock, or `None` to leave it as is.
    /// Returns the page as read and the lock now in effect.
    async fn swap_lock_with<F>(&self, key: &str, mut plan: F) -> EngineResult<(Page, EditLock)>
    where
        F: FnMut(&EditLock, Timestamp) -> Result<Option<EditLock>, CoreError>,
    {
        for attempt in 1..=MAX_LOCK_ATTEMPTS {
            let page = self.resolve_page(key).await?;
            let now = self.now();
            let current = page.lock();
            let Some(next) = plan(&current, now)? else {
                return Ok((page, current));
            };
            if self
                .store
                .swap_lock(page.id, current.fingerprint(), &next, now)
                .await?
            {
                return Ok((page, next));
            }
            tracing::warn!(page_id = page.id, attempt, "Lock swap lost a race");
        }
        Err(CoreError::Conflict("The page lock changed concurrently; try again".into()).into())
    }
}
