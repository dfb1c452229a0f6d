//! Policy evaluator: who may edit, move, protect, or review.
//!
//! Every function here is pure. Callers pass the acting identity, the
//! page's protection, and the current time; nothing is read from storage.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, ParseEnumError};
use crate::roles::{Actor, Role};
use crate::types::{DbId, Timestamp};

/// Lifetime edit count at which an account becomes autoconfirmed.
pub const AUTOCONFIRM_MIN_EDITS: i64 = 10;

/// Account age at which an account becomes autoconfirmed.
pub const AUTOCONFIRM_MIN_AGE_DAYS: i64 = 7;

// ---------------------------------------------------------------------------
// Protection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtectionLevel {
    #[default]
    None,
    Semi,
    Full,
    Admin,
}

impl ProtectionLevel {
    pub const ALL: [ProtectionLevel; 4] = [
        ProtectionLevel::None,
        ProtectionLevel::Semi,
        ProtectionLevel::Full,
        ProtectionLevel::Admin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProtectionLevel::None => "none",
            ProtectionLevel::Semi => "semi",
            ProtectionLevel::Full => "full",
            ProtectionLevel::Admin => "admin",
        }
    }
}

impl fmt::Display for ProtectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtectionLevel {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(ProtectionLevel::None),
            "semi" => Ok(ProtectionLevel::Semi),
            "full" => Ok(ProtectionLevel::Full),
            "admin" => Ok(ProtectionLevel::Admin),
            other => Err(ParseEnumError::new("protection level", other)),
        }
    }
}

impl TryFrom<String> for ProtectionLevel {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A page's protection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Protection {
    pub level: ProtectionLevel,
    pub reason: Option<String>,
    pub protected_by: Option<String>,
    pub protected_by_id: Option<DbId>,
    pub protected_until: Option<Timestamp>,
    /// Roles granted edit access regardless of the level table.
    #[serde(default)]
    pub allowed_roles: Vec<Role>,
}

impl Protection {
    /// The level in force at `now`. An elapsed `protected_until` lapses the
    /// protection to `none` without any write.
    pub fn effective_level(&self, now: Timestamp) -> ProtectionLevel {
        match self.protected_until {
            Some(until) if now > until => ProtectionLevel::None,
            _ => self.level,
        }
    }
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

/// Why an edit was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditDenied {
    /// No identity, or an anonymous one, on a protected page.
    NotLoggedIn,
    /// The identity lacks the `can_edit` permission.
    EditPermissionMissing,
    /// Protection requires a higher role (or autoconfirmed status).
    InsufficientRole { level: ProtectionLevel },
    Banned,
}

impl From<EditDenied> for CoreError {
    fn from(denied: EditDenied) -> Self {
        match denied {
            EditDenied::NotLoggedIn => {
                CoreError::Unauthorized("You must be logged in to edit this page".into())
            }
            EditDenied::EditPermissionMissing => {
                CoreError::Forbidden("You do not have permission to edit".into())
            }
            EditDenied::InsufficientRole { level } => CoreError::Forbidden(format!(
                "This page is under {level} protection and your role cannot edit it"
            )),
            EditDenied::Banned => CoreError::Forbidden("Your account is banned".into()),
        }
    }
}

/// `true` when the account has at least [`AUTOCONFIRM_MIN_EDITS`] edits or
/// is at least [`AUTOCONFIRM_MIN_AGE_DAYS`] old.
pub fn is_autoconfirmed(actor: &Actor, now: Timestamp) -> bool {
    if actor.is_anonymous() {
        return false;
    }
    if actor.edits >= AUTOCONFIRM_MIN_EDITS {
        return true;
    }
    actor
        .created_at
        .is_some_and(|created| now - created >= Duration::days(AUTOCONFIRM_MIN_AGE_DAYS))
}

/// Decide whether `actor` may edit a page protected by `protection`.
pub fn check_edit(
    actor: Option<&Actor>,
    protection: &Protection,
    now: Timestamp,
) -> Result<(), EditDenied> {
    let level = protection.effective_level(now);
    let Some(actor) = actor else {
        return Err(EditDenied::NotLoggedIn);
    };
    if actor.is_banned {
        return Err(EditDenied::Banned);
    }
    if actor.is_anonymous() && level != ProtectionLevel::None {
        return Err(EditDenied::NotLoggedIn);
    }
    if !actor.is_anonymous() && protection.allowed_roles.contains(&actor.role) {
        return Ok(());
    }

    let allowed = match level {
        ProtectionLevel::None => {
            if !actor.permissions.can_edit {
                return Err(EditDenied::EditPermissionMissing);
            }
            true
        }
        ProtectionLevel::Semi => {
            is_autoconfirmed(actor, now) || actor.at_least(Role::Moderator)
        }
        ProtectionLevel::Full => actor.at_least(Role::Moderator),
        ProtectionLevel::Admin => actor.at_least(Role::Admin),
    };

    if allowed {
        Ok(())
    } else {
        Err(EditDenied::InsufficientRole { level })
    }
}

pub fn can_edit_page(actor: Option<&Actor>, protection: &Protection, now: Timestamp) -> bool {
    check_edit(actor, protection, now).is_ok()
}

pub fn can_protect_page(actor: &Actor) -> bool {
    !actor.is_banned
        && !actor.is_anonymous()
        && (actor.permissions.can_protect || actor.at_least(Role::Moderator))
}

pub fn can_move_page(actor: &Actor) -> bool {
    !actor.is_banned && actor.at_least(Role::Moderator)
}

pub fn can_review(actor: &Actor) -> bool {
    !actor.is_banned && actor.at_least(Role::Moderator)
}

/// Moderators may clear locks they do not hold.
pub fn can_override_lock(actor: &Actor) -> bool {
    actor.at_least(Role::Moderator)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
