//! Shared query parameter types for API handlers.

use folio_core::moderation::SubmissionStatus;
use folio_core::revision::{EditType, RevisionQuery, RevisionSort};
use serde::Deserialize;

/// Generic pagination parameters (`?limit=&offset=`).
///
/// Values are clamped in the engine via `clamp_limit` / `clamp_offset`.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// `?author=&edit_type=&sort=&limit=&skip=` for revision history.
#[derive(Debug, Default, Deserialize)]
pub struct RevisionListParams {
    pub author: Option<String>,
    pub edit_type: Option<EditType>,
    pub sort: Option<RevisionSort>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

impl From<RevisionListParams> for RevisionQuery {
    fn from(params: RevisionListParams) -> Self {
        RevisionQuery::new(
            params.author,
            params.edit_type,
            params.sort,
            params.limit,
            params.skip,
        )
    }
}

/// `?status=&limit=&offset=` for the moderation queue.
#[derive(Debug, Default, Deserialize)]
pub struct SubmissionListParams {
    pub status: Option<SubmissionStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
