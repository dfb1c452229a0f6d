//! Handlers for revision history and reverts.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use folio_db::models::revision::Revision;
use folio_engine::views::{RevisionDetail, RevisionList};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::MaybeAuthUser;
use crate::query::RevisionListParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for reverting a page.
#[derive(Debug, Default, Deserialize)]
pub struct RevertRequest {
    /// Defaults to "Reverted to revision N".
    #[serde(default)]
    pub summary: Option<String>,
}

/// GET /api/v1/pages/{key}/revisions
///
/// Supports `?author=&edit_type=&sort=newest|oldest&limit=&skip=`.
pub async fn list_revisions(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(params): Query<RevisionListParams>,
) -> AppResult<Json<DataResponse<RevisionList>>> {
    let list = state.engine.list_revisions(&key, params.into()).await?;
    Ok(Json(DataResponse { data: list }))
}

/// GET /api/v1/pages/{key}/revisions/{n}
///
/// Revision `n` paired with revision `n - 1` for diffing.
pub async fn get_revision(
    State(state): State<AppState>,
    Path((key, number)): Path<(String, i32)>,
) -> AppResult<Json<DataResponse<RevisionDetail>>> {
    let detail = state.engine.get_revision_detail(&key, number).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// POST /api/v1/pages/{key}/revert/{n}
///
/// Appends a new `revert` revision carrying revision `n`'s content.
pub async fn revert(
    State(state): State<AppState>,
    caller: MaybeAuthUser,
    Path((key, number)): Path<(String, i32)>,
    Json(input): Json<RevertRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Revision>>)> {
    let revision = state
        .engine
        .revert(&key, number, &caller.0, input.summary)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: revision })))
}
