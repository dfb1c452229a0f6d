//! Page move markers and naming rules.
//!
//! A move touches two pages, so it runs as a sequence of idempotent steps
//! keyed by a persisted marker. A marker still `started` after
//! [`MOVE_REPAIR_AFTER_SECS`] is picked up by the repair pass.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, ParseEnumError};
use crate::wiki::{generate_slug, validate_slug};

/// Age after which a `started` move is considered stalled.
pub const MOVE_REPAIR_AFTER_SECS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveState {
    Started,
    Completed,
    Failed,
}

impl MoveState {
    pub fn as_str(self) -> &'static str {
        match self {
            MoveState::Started => "started",
            MoveState::Completed => "completed",
            MoveState::Failed => "failed",
        }
    }
}

impl fmt::Display for MoveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MoveState {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "started" => Ok(MoveState::Started),
            "completed" => Ok(MoveState::Completed),
            "failed" => Ok(MoveState::Failed),
            other => Err(ParseEnumError::new("move state", other)),
        }
    }
}

impl TryFrom<String> for MoveState {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Derive the destination slug, rejecting titles with no usable slug and
/// destinations that resolve to the source's own slug.
pub fn check_distinct_target(from_slug: &str, to_title: &str) -> Result<String, CoreError> {
    let to_slug = generate_slug(to_title);
    validate_slug(&to_slug)?;
    if to_slug == from_slug {
        return Err(CoreError::Validation(
            "Destination title must differ from the current title".into(),
        ));
    }
    Ok(to_slug)
}

/// Summary recorded on both revisions a move writes.
pub fn move_summary(from: &str, to: &str, reason: Option<&str>) -> String {
    match reason.filter(|r| !r.trim().is_empty()) {
        Some(reason) => format!("Moved [[{from}]] to [[{to}]]: {reason}"),
        None => format!("Moved [[{from}]] to [[{to}]]"),
    }
}
