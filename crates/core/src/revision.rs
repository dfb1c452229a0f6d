//! Revision bookkeeping: edit types, size deltas, and list-query clamping.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseEnumError;
use crate::paging::{clamp_limit, clamp_offset};

/// Default page size for revision listings.
pub const DEFAULT_REVISION_LIMIT: i64 = 50;

/// Upper bound for revision listings.
pub const MAX_REVISION_LIMIT: i64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditType {
    Create,
    Edit,
    Revert,
    Redirect,
    Protect,
    Move,
}

impl EditType {
    pub fn as_str(self) -> &'static str {
        match self {
            EditType::Create => "create",
            EditType::Edit => "edit",
            EditType::Revert => "revert",
            EditType::Redirect => "redirect",
            EditType::Protect => "protect",
            EditType::Move => "move",
        }
    }
}

impl fmt::Display for EditType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(EditType::Create),
            "edit" => Ok(EditType::Edit),
            "revert" => Ok(EditType::Revert),
            "redirect" => Ok(EditType::Redirect),
            "protect" => Ok(EditType::Protect),
            "move" => Ok(EditType::Move),
            other => Err(ParseEnumError::new("edit type", other)),
        }
    }
}

impl TryFrom<String> for EditType {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Length of a content snapshot in Unicode scalar values.
pub fn content_length(content: &str) -> i32 {
    i32::try_from(content.chars().count()).unwrap_or(i32::MAX)
}

/// Signed size delta against the previous snapshot; `0` for a first revision.
pub fn size_change(previous_length: Option<i32>, new_length: i32) -> i32 {
    match previous_length {
        Some(prev) => new_length - prev,
        None => 0,
    }
}

/// Number the next revision receives given the page's current revision.
pub fn next_revision_number(current_revision: Option<i32>) -> i32 {
    current_revision.map_or(1, |n| n + 1)
}

/// Default summary for a revert commit.
pub fn revert_summary(target: i32) -> String {
    format!("Reverted to revision {target}")
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevisionSort {
    #[default]
    Newest,
    Oldest,
}

/// Normalized revision list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionQuery {
    pub author: Option<String>,
    pub edit_type: Option<EditType>,
    pub sort: RevisionSort,
    pub limit: i64,
    pub skip: i64,
}

impl RevisionQuery {
    pub fn new(
        author: Option<String>,
        edit_type: Option<EditType>,
        sort: Option<RevisionSort>,
        limit: Option<i64>,
        skip: Option<i64>,
    ) -> Self {
        Self {
            author: author.filter(|a| !a.trim().is_empty()),
            edit_type,
            sort: sort.unwrap_or_default(),
            limit: clamp_limit(limit, DEFAULT_REVISION_LIMIT, MAX_REVISION_LIMIT),
            skip: clamp_offset(skip),
        }
    }
}

impl Default for RevisionQuery {
    fn default() -> Self {
        Self::new(None, None, None, None, None)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
