//! Read models returned by engine operations.

use folio_core::edit_lock::{lock_status, LockStatus};
use folio_core::policy::{Protection, ProtectionLevel};
use folio_core::roles::Role;
use folio_core::types::{DbId, Timestamp};
use folio_db::models::page::Page;
use folio_db::models::revision::{Revision, RevisionSummary};
use serde::Serialize;

/// Stored protection plus the level actually in force.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtectionView {
    pub level: ProtectionLevel,
    pub effective_level: ProtectionLevel,
    pub reason: Option<String>,
    pub protected_by: Option<String>,
    pub protected_by_id: Option<DbId>,
    pub protected_until: Option<Timestamp>,
    pub allowed_roles: Vec<Role>,
}

impl ProtectionView {
    pub fn new(protection: Protection, now: Timestamp) -> Self {
        Self {
            effective_level: protection.effective_level(now),
            level: protection.level,
            reason: protection.reason,
            protected_by: protection.protected_by,
            protected_by_id: protection.protected_by_id,
            protected_until: protection.protected_until,
            allowed_roles: protection.allowed_roles,
        }
    }
}

/// A page as readers see it: lock normalized, protection evaluated.
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
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
    pub current_revision: i32,
    pub content_length: i32,
    pub edits: i32,
    pub last_editor: String,
    pub last_editor_id: Option<DbId>,
    pub last_edit_date: Timestamp,
    pub last_edit_summary: Option<String>,
    pub protection: ProtectionView,
    pub lock: LockStatus,
    pub watchers: Vec<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PageView {
    pub fn new(page: Page, watchers: Vec<DbId>, caller: Option<DbId>, now: Timestamp) -> Self {
        let protection = ProtectionView::new(page.protection(), now);
        let lock = lock_status(&page.lock(), caller, now);
        Self {
            id: page.id,
            title: page.title,
            slug: page.slug,
            namespace: page.namespace,
            content: page.content,
            summary: page.summary,
            categories: page.categories,
            tags: page.tags,
            is_redirect: page.is_redirect,
            redirect_target: page.redirect_target,
            current_revision: page.current_revision,
            content_length: page.content_length,
            edits: page.edits,
            last_editor: page.last_editor,
            last_editor_id: page.last_editor_id,
            last_edit_date: page.last_edit_date,
            last_edit_summary: page.last_edit_summary,
            protection,
            lock,
            watchers,
            created_at: page.created_at,
            updated_at: page.updated_at,
        }
    }
}

/// One page of revision metadata.
#[derive(Debug, Clone, Serialize)]
pub struct RevisionList {
    pub items: Vec<RevisionSummary>,
    pub total: i64,
    pub limit: i64,
    pub skip: i64,
}

/// Revision `n` with content, paired with revision `n - 1`.
#[derive(Debug, Clone, Serialize)]
pub struct RevisionDetail {
    pub revision: Revision,
    pub previous: Option<Revision>,
}

/// Result of a completed page move.
#[derive(Debug, Clone, Serialize)]
pub struct MoveOutcome {
    pub move_id: DbId,
    pub source_page_id: DbId,
    pub destination_page_id: DbId,
    pub from_title: String,
    pub to_title: String,
    pub to_slug: String,
}
