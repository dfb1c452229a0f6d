//! Page aggregate row.

use folio_core::edit_lock::EditLock;
use folio_core::policy::{Protection, ProtectionLevel};
use folio_core::revision::EditType;
use folio_core::roles::Role;
use folio_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `pages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Page {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub namespace: String,
    pub content: String,
    pub summary: Option<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub is_redirect: bool,
    pub redirect_target: Option<String>,
    pub is_deleted: bool,

    pub current_revision: i32,
    pub content_length: i32,
    pub edits: i32,
    pub last_editor: String,
    pub last_editor_id: Option<DbId>,
    pub last_edit_date: Timestamp,
    pub last_edit_summary: Option<String>,

    #[sqlx(try_from = "String")]
    pub protection_level: ProtectionLevel,
    pub protection_reason: Option<String>,
    pub protected_by: Option<String>,
    pub protected_by_id: Option<DbId>,
    pub protected_until: Option<Timestamp>,
    pub allowed_roles: Vec<String>,

    pub is_locked: bool,
    pub locked_by: Option<String>,
    pub locked_by_id: Option<DbId>,
    pub lock_start_time: Option<Timestamp>,
    pub lock_expiry: Option<Timestamp>,
    pub lock_reason: Option<String>,

    pub created_from_submission: Option<DbId>,
    pub created_by_move: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Page {
    /// Protection settings as stored. Unknown role names are skipped.
    pub fn protection(&self) -> Protection {
        Protection {
            level: self.protection_level,
            reason: self.protection_reason.clone(),
            protected_by: self.protected_by.clone(),
            protected_by_id: self.protected_by_id,
            protected_until: self.protected_until,
            allowed_roles: self
                .allowed_roles
                .iter()
                .filter_map(|r| r.parse::<Role>().ok())
                .collect(),
        }
    }

    /// Lock fields as stored, without expiry normalization.
    pub fn lock(&self) -> EditLock {
        EditLock {
            is_locked: self.is_locked,
            locked_by: self.locked_by.clone(),
            locked_by_id: self.locked_by_id,
            lock_start_time: self.lock_start_time,
            lock_expiry: self.lock_expiry,
            lock_reason: self.lock_reason.clone(),
        }
    }

    pub(crate) fn set_protection(&mut self, protection: &Protection) {
        self.protection_level = protection.level;
        self.protection_reason = protection.reason.clone();
        self.protected_by = protection.protected_by.clone();
        self.protected_by_id = protection.protected_by_id;
        self.protected_until = protection.protected_until;
        self.allowed_roles = role_names(&protection.allowed_roles);
    }

    pub(crate) fn set_lock(&mut self, lock: &EditLock) {
        self.is_locked = lock.is_locked;
        self.locked_by = lock.locked_by.clone();
        self.locked_by_id = lock.locked_by_id;
        self.lock_start_time = lock.lock_start_time;
        self.lock_expiry = lock.lock_expiry;
        self.lock_reason = lock.lock_reason.clone();
    }
}

pub(crate) fn role_names(roles: &[Role]) -> Vec<String> {
    roles.iter().map(|r| r.as_str().to_string()).collect()
}

/// Input for creating a page together with its first revision.
#[derive(Debug, Clone)]
pub struct NewPage {
    pub title: String,
    pub slug: String,
    pub namespace: String,
    pub content: String,
    pub summary: Option<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    /// Parsed from `content`; `Some` stores the page as a redirect.
    pub redirect_target: Option<String>,
    pub protection: Protection,
    /// Users watching the page from the start.
    pub watchers: Vec<DbId>,

    pub author: String,
    pub author_id: Option<DbId>,
    /// Summary of revision 1.
    pub edit_summary: Option<String>,
    /// `create` for new pages, `move` for move destinations.
    pub edit_type: EditType,
    pub is_minor_edit: bool,

    pub created_from_submission: Option<DbId>,
    pub created_by_move: Option<DbId>,
    pub now: Timestamp,
}
