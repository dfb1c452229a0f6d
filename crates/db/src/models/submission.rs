//! Moderation queue rows.

use folio_core::moderation::{SubmissionStatus, SubmissionType};
use folio_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `submissions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Submission {
    pub id: DbId,
    #[sqlx(try_from = "String")]
    #[serde(rename = "type")]
    pub submission_type: SubmissionType,
    #[sqlx(try_from = "String")]
    pub status: SubmissionStatus,
    pub target_title: String,
    pub target_slug: String,
    pub namespace: String,
    pub page_id: Option<DbId>,
    pub author: String,
    pub author_id: Option<DbId>,
    pub content: String,
    pub summary: Option<String>,
    pub edit_summary: Option<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub is_minor_edit: bool,
    pub reason: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewer_id: Option<DbId>,
    pub reviewed_at: Option<Timestamp>,
    #[serde(skip)]
    pub claimed_by: Option<DbId>,
    #[serde(skip)]
    pub claimed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Submission {
    /// `true` while an approval claim taken at or after `stale_before` is held,
    /// whoever holds it.
    pub fn has_live_claim(&self, stale_before: Timestamp) -> bool {
        matches!((self.claimed_by, self.claimed_at), (Some(_), Some(at)) if at >= stale_before)
    }

    /// The approval claim currently recorded on the row.
    pub fn review_claim(&self) -> Option<ReviewClaim> {
        Some(ReviewClaim {
            claimer: self.claimed_by?,
            claimed_at: self.claimed_at?,
        })
    }
}

/// One approval attempt's hold on a submission. The claim time doubles as a
/// token: a later claim by the same reviewer is a different claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewClaim {
    pub claimer: DbId,
    pub claimed_at: Timestamp,
}

/// Input for enqueuing a submission.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub submission_type: SubmissionType,
    pub target_title: String,
    pub target_slug: String,
    pub namespace: String,
    pub page_id: Option<DbId>,
    pub author: String,
    pub author_id: Option<DbId>,
    pub content: String,
    pub summary: Option<String>,
    pub edit_summary: Option<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub is_minor_edit: bool,
    pub now: Timestamp,
}

/// Reviewer metadata written when a submission leaves the queue or is held.
#[derive(Debug, Clone)]
pub struct ReviewRecord {
    pub status: SubmissionStatus,
    pub reviewed_by: String,
    pub reviewer_id: DbId,
    pub reason: Option<String>,
    pub reviewed_at: Timestamp,
}
