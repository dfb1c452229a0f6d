//! Revision rows. Revisions are immutable once inserted.

use folio_core::revision::EditType;
use folio_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `revisions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Revision {
    pub id: DbId,
    pub page_id: DbId,
    pub revision_number: i32,
    pub content: String,
    pub summary: Option<String>,
    pub author: String,
    pub author_id: Option<DbId>,
    #[sqlx(try_from = "String")]
    pub edit_type: EditType,
    pub is_minor_edit: bool,
    pub content_length: i32,
    pub size_change: i32,
    pub is_reverted: bool,
    pub is_verified: bool,
    pub submission_id: Option<DbId>,
    pub move_id: Option<DbId>,
    #[serde(rename = "timestamp")]
    pub created_at: Timestamp,
}

/// Revision metadata without the content snapshot, used by listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RevisionSummary {
    pub id: DbId,
    pub page_id: DbId,
    pub revision_number: i32,
    pub summary: Option<String>,
    pub author: String,
    pub author_id: Option<DbId>,
    #[sqlx(try_from = "String")]
    pub edit_type: EditType,
    pub is_minor_edit: bool,
    pub content_length: i32,
    pub size_change: i32,
    pub is_reverted: bool,
    pub is_verified: bool,
    #[serde(rename = "timestamp")]
    pub created_at: Timestamp,
}

impl From<&Revision> for RevisionSummary {
    fn from(r: &Revision) -> Self {
        Self {
            id: r.id,
            page_id: r.page_id,
            revision_number: r.revision_number,
            summary: r.summary.clone(),
            author: r.author.clone(),
            author_id: r.author_id,
            edit_type: r.edit_type,
            is_minor_edit: r.is_minor_edit,
            content_length: r.content_length,
            size_change: r.size_change,
            is_reverted: r.is_reverted,
            is_verified: r.is_verified,
            created_at: r.created_at,
        }
    }
}

/// Input for appending a revision to an existing page.
///
/// The commit only lands while the page's `current_revision` still equals
/// `expected_revision`.
#[derive(Debug, Clone)]
pub struct NewRevision {
    pub page_id: DbId,
    pub expected_revision: i32,
    pub content: String,
    pub content_length: i32,
    pub size_change: i32,
    pub summary: Option<String>,
    pub author: String,
    pub author_id: Option<DbId>,
    pub edit_type: EditType,
    pub is_minor_edit: bool,
    /// `Some` turns the page into a redirect; `None` clears redirect state.
    pub redirect_target: Option<String>,
    /// Page-level fields replaced when present.
    pub page_summary: Option<String>,
    pub categories: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub submission_id: Option<DbId>,
    pub move_id: Option<DbId>,
    pub now: Timestamp,
}
