//! Edit lock rules: lazy expiry, acquire/renew/release planning.
//!
//! The planners take the lock as last read from the store and return the
//! lock that should replace it. The store applies the replacement with a
//! compare-and-swap on [`LockFingerprint`], so a planner's decision only
//! lands if nobody changed the lock in between.
//!
//! A stored lock whose expiry has passed is treated as absent by every
//! reader, even though its row still says `is_locked = true` until the next
//! write or sweep touches it.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::policy::can_override_lock;
use crate::roles::Actor;
use crate::types::{DbId, Timestamp};

/// Lock lifetime measured from acquisition or the last renewal.
pub const LOCK_TTL_MINS: i64 = 10;

/// Reason recorded on locks taken through the edit flow.
pub const LOCK_REASON_EDITING: &str = "editing";

/// Default interval of the background sweep that clears expired locks.
pub const LOCK_SWEEP_INTERVAL_SECS: u64 = 60;

pub fn lock_ttl() -> Duration {
    Duration::minutes(LOCK_TTL_MINS)
}

/// A page's edit lock fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditLock {
    pub is_locked: bool,
    pub locked_by: Option<String>,
    pub locked_by_id: Option<DbId>,
    pub lock_start_time: Option<Timestamp>,
    pub lock_expiry: Option<Timestamp>,
    pub lock_reason: Option<String>,
}

/// The fields a lock compare-and-swap matches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockFingerprint {
    pub holder_id: Option<DbId>,
    pub expiry: Option<Timestamp>,
}

impl EditLock {
    pub fn unlocked() -> Self {
        Self::default()
    }

    /// `true` when locked and `now` has not passed the expiry.
    pub fn is_active(&self, now: Timestamp) -> bool {
        self.is_locked && self.lock_expiry.is_some_and(|expiry| now <= expiry)
    }

    /// The lock as every reader should see it at `now`.
    pub fn normalized(&self, now: Timestamp) -> EditLock {
        if self.is_active(now) {
            self.clone()
        } else {
            EditLock::unlocked()
        }
    }

    pub fn held_by(&self, user_id: DbId, now: Timestamp) -> bool {
        self.is_active(now) && self.locked_by_id == Some(user_id)
    }

    /// Fingerprint of the stored (not normalized) fields.
    pub fn fingerprint(&self) -> LockFingerprint {
        LockFingerprint {
            holder_id: if self.is_locked { self.locked_by_id } else { None },
            expiry: if self.is_locked { self.lock_expiry } else { None },
        }
    }

    fn held_error(&self) -> CoreError {
        CoreError::LockHeld {
            holder: self.locked_by.clone().unwrap_or_default(),
            holder_id: self.locked_by_id.unwrap_or_default(),
            expires_at: self.lock_expiry.unwrap_or_default(),
        }
    }
}

/// Plan an acquisition (or same-holder refresh) by `user_id`.
///
/// Fails with [`CoreError::LockHeld`] when another user holds an active lock.
pub fn plan_acquire(
    current: &EditLock,
    user_id: DbId,
    username: &str,
    now: Timestamp,
) -> Result<EditLock, CoreError> {
    let current = current.normalized(now);
    if current.is_locked && current.locked_by_id != Some(user_id) {
        return Err(current.held_error());
    }

    let start = if current.is_locked {
        current.lock_start_time.unwrap_or(now)
    } else {
        now
    };

    Ok(EditLock {
        is_locked: true,
        locked_by: Some(username.to_string()),
        locked_by_id: Some(user_id),
        lock_start_time: Some(start),
        lock_expiry: Some(now + lock_ttl()),
        lock_reason: Some(LOCK_REASON_EDITING.to_string()),
    })
}

/// Plan a renewal. Only the holder of an active lock may renew.
pub fn plan_renew(current: &EditLock, user_id: DbId, now: Timestamp) -> Result<EditLock, CoreError> {
    if !current.held_by(user_id, now) {
        return Err(CoreError::NotLockHolder);
    }
    Ok(EditLock {
        lock_expiry: Some(now + lock_ttl()),
        ..current.clone()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleasePlan {
    /// Stored fields must be cleared.
    Clear,
    /// Nothing stored; release is a no-op.
    AlreadyUnlocked,
}

/// Plan a release by `actor`: the holder or a moderator.
pub fn plan_release(
    current: &EditLock,
    actor: &Actor,
    now: Timestamp,
) -> Result<ReleasePlan, CoreError> {
    let user_id = actor.require_user()?;
    if !current.is_locked {
        return Ok(ReleasePlan::AlreadyUnlocked);
    }
    if !current.is_active(now) {
        // Expired leftovers may be cleared by anyone.
        return Ok(ReleasePlan::Clear);
    }
    if current.locked_by_id == Some(user_id) || can_override_lock(actor) {
        return Ok(ReleasePlan::Clear);
    }
    Err(CoreError::Forbidden(format!(
        "Only {} or a moderator can release this lock",
        current.locked_by.as_deref().unwrap_or("the holder")
    )))
}

/// Read-side view of a page's lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockStatus {
    pub is_locked: bool,
    pub locked_by: Option<String>,
    pub locked_by_id: Option<DbId>,
    pub lock_start_time: Option<Timestamp>,
    pub lock_expiry: Option<Timestamp>,
    pub lock_reason: Option<String>,
    pub held_by_caller: bool,
    pub seconds_remaining: Option<i64>,
}

pub fn lock_status(lock: &EditLock, caller: Option<DbId>, now: Timestamp) -> LockStatus {
    let lock = lock.normalized(now);
    LockStatus {
        held_by_caller: lock.is_locked && caller.is_some() && lock.locked_by_id == caller,
        seconds_remaining: lock.lock_expiry.map(|e| (e - now).num_seconds().max(0)),
        is_locked: lock.is_locked,
        locked_by: lock.locked_by,
        locked_by_id: lock.locked_by_id,
        lock_start_time: lock.lock_start_time,
        lock_expiry: lock.lock_expiry,
        lock_reason: lock.lock_reason,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::roles::{Permissions, Role};

    /// Assert that a result is a `LockHeld` error naming `holder`.
    macro_rules! assert_lock_held {
        ($result:expr, $holder:expr) => {
            match $result {
                Err(CoreError::LockHeld { holder, .. }) => assert_eq!(holder, $holder),
                other => panic!("expected LockHeld, got {other:?}"),
            }
        };
    }

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn actor(id: DbId, role: Role) -> Actor {
        Actor {
            user_id: Some(id),
            username: format!("user{id}"),
            role,
            permissions: Permissions::for_role(role),
            edits: 0,
            created_at: None,
            is_banned: false,
        }
    }

    #[test]
    fn acquire_on_unlocked_page_sets_all_fields() {
        let lock = plan_acquire(&EditLock::unlocked(), 1, "alice", t0()).unwrap();
        assert!(lock.is_locked);
        assert_eq!(lock.locked_by.as_deref(), Some("alice"));
        assert_eq!(lock.locked_by_id, Some(1));
        assert_eq!(lock.lock_start_time, Some(t0()));
        assert_eq!(lock.lock_expiry, Some(t0() + Duration::minutes(10)));
        assert_eq!(lock.lock_reason.as_deref(), Some(LOCK_REASON_EDITING));
    }

    #[test]
    fn acquire_by_other_user_reports_holder() {
        let held = plan_acquire(&EditLock::unlocked(), 1, "alice", t0()).unwrap();
        let result = plan_acquire(&held, 2, "bob", t0() + Duration::minutes(1));
        assert_lock_held!(result, "alice");
    }

    #[test]
    fn same_holder_refresh_preserves_start_time() {
        let held = plan_acquire(&EditLock::unlocked(), 1, "alice", t0()).unwrap();
        let later = t0() + Duration::minutes(4);
        let refreshed = plan_acquire(&held, 1, "alice", later).unwrap();
        assert_eq!(refreshed.lock_start_time, Some(t0()));
        assert_eq!(refreshed.lock_expiry, Some(later + lock_ttl()));
    }

    #[test]
    fn expired_lock_is_acquirable_by_anyone() {
        let held = plan_acquire(&EditLock::unlocked(), 1, "alice", t0()).unwrap();
        let after = t0() + lock_ttl() + Duration::seconds(1);
        assert!(!held.is_active(after));
        let taken = plan_acquire(&held, 2, "bob", after).unwrap();
        assert_eq!(taken.locked_by_id, Some(2));
        assert_eq!(taken.lock_start_time, Some(after));
    }

    #[test]
    fn lock_is_still_active_exactly_at_expiry() {
        let held = plan_acquire(&EditLock::unlocked(), 1, "alice", t0()).unwrap();
        assert!(held.is_active(t0() + lock_ttl()));
    }

    #[test]
    fn renew_extends_from_now() {
        let held = plan_acquire(&EditLock::unlocked(), 1, "alice", t0()).unwrap();
        let renew_at = t0() + Duration::minutes(9);
        let renewed = plan_renew(&held, 1, renew_at).unwrap();
        assert_eq!(renewed.lock_expiry, Some(renew_at + lock_ttl()));
        assert_eq!(renewed.lock_start_time, Some(t0()));
    }

    #[test]
    fn renew_requires_active_holder() {
        let held = plan_acquire(&EditLock::unlocked(), 1, "alice", t0()).unwrap();
        assert!(matches!(
            plan_renew(&held, 2, t0()),
            Err(CoreError::NotLockHolder)
        ));
        let expired = t0() + lock_ttl() + Duration::seconds(1);
        assert!(matches!(
            plan_renew(&held, 1, expired),
            Err(CoreError::NotLockHolder)
        ));
    }

    #[test]
    fn release_rules() {
        let held = plan_acquire(&EditLock::unlocked(), 1, "alice", t0()).unwrap();
        assert_eq!(
            plan_release(&held, &actor(1, Role::Editor), t0()).unwrap(),
            ReleasePlan::Clear
        );
        assert!(matches!(
            plan_release(&held, &actor(2, Role::Editor), t0()),
            Err(CoreError::Forbidden(_))
        ));
        assert_eq!(
            plan_release(&held, &actor(3, Role::Moderator), t0()).unwrap(),
            ReleasePlan::Clear
        );
        assert_eq!(
            plan_release(&EditLock::unlocked(), &actor(2, Role::Editor), t0()).unwrap(),
            ReleasePlan::AlreadyUnlocked
        );
    }

    #[test]
    fn status_hides_expired_lock() {
        let held = plan_acquire(&EditLock::unlocked(), 1, "alice", t0()).unwrap();
        let status = lock_status(&held, Some(1), t0() + Duration::minutes(3));
        assert!(status.is_locked);
        assert!(status.held_by_caller);
        assert_eq!(status.seconds_remaining, Some(7 * 60));

        let status = lock_status(&held, Some(1), t0() + Duration::minutes(11));
        assert!(!status.is_locked);
        assert!(!status.held_by_caller);
        assert_eq!(status.locked_by, None);
    }

    #[test]
    fn fingerprint_ignores_stale_fields_on_unlocked_rows() {
        let lock = EditLock {
            is_locked: false,
            locked_by_id: Some(4),
            ..EditLock::default()
        };
        assert_eq!(lock.fingerprint().holder_id, None);
    }
}
