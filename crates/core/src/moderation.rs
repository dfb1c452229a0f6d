//! Moderation queue state machine.
//!
//! ```text
//! pending ──approve──▶ approved   (terminal)
//!    │ ───reject───▶ rejected   (terminal)
//!    └────hold────▶ onhold ──approve/reject──▶ approved / rejected
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, ParseEnumError};
use crate::types::DbId;

/// How long an approval claim blocks other reviewers before it is stale.
pub const REVIEW_CLAIM_TTL_SECS: i64 = 300;

/// Maximum length of a moderator's review note.
pub const MAX_REASON_LEN: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionType {
    Create,
    Edit,
}

impl SubmissionType {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionType::Create => "create",
            SubmissionType::Edit => "edit",
        }
    }
}

impl fmt::Display for SubmissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(SubmissionType::Create),
            "edit" => Ok(SubmissionType::Edit),
            other => Err(ParseEnumError::new("submission type", other)),
        }
    }
}

impl TryFrom<String> for SubmissionType {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
    #[serde(rename = "onhold")]
    OnHold,
}

impl SubmissionStatus {
    /// Statuses a review may act on.
    pub const REVIEWABLE: [SubmissionStatus; 2] = [SubmissionStatus::Pending, SubmissionStatus::OnHold];

    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
            SubmissionStatus::OnHold => "onhold",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SubmissionStatus::Approved | SubmissionStatus::Rejected)
    }

    pub fn is_reviewable(self) -> bool {
        Self::REVIEWABLE.contains(&self)
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SubmissionStatus::Pending),
            "approved" => Ok(SubmissionStatus::Approved),
            "rejected" => Ok(SubmissionStatus::Rejected),
            "onhold" => Ok(SubmissionStatus::OnHold),
            other => Err(ParseEnumError::new("submission status", other)),
        }
    }
}

impl TryFrom<String> for SubmissionStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    Approve,
    Reject,
    Hold,
}

impl ReviewAction {
    pub fn target_status(self) -> SubmissionStatus {
        match self {
            ReviewAction::Approve => SubmissionStatus::Approved,
            ReviewAction::Reject => SubmissionStatus::Rejected,
            ReviewAction::Hold => SubmissionStatus::OnHold,
        }
    }

    /// Event name published for this outcome.
    pub fn event_type(self) -> &'static str {
        match self {
            ReviewAction::Approve => "submission.approved",
            ReviewAction::Reject => "submission.rejected",
            ReviewAction::Hold => "submission.held",
        }
    }
}

/// Validate a review of submission `id` currently in `from`.
///
/// Returns the status the submission moves to.
pub fn validate_transition(
    id: DbId,
    from: SubmissionStatus,
    action: ReviewAction,
) -> Result<SubmissionStatus, CoreError> {
    if !from.is_reviewable() {
        return Err(CoreError::AlreadyResolved {
            id,
            status: from.to_string(),
        });
    }
    if from == SubmissionStatus::OnHold && action == ReviewAction::Hold {
        return Err(CoreError::Conflict(format!(
            "Submission {id} is already on hold"
        )));
    }
    Ok(action.target_status())
}

/// Validate an optional moderator note.
pub fn validate_reason(reason: Option<&str>) -> Result<(), CoreError> {
    if reason.is_some_and(|r| r.len() > MAX_REASON_LEN) {
        return Err(CoreError::Validation(format!(
            "Reason must be at most {MAX_REASON_LEN} characters"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
