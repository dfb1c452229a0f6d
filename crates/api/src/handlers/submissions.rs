//! Handlers for the `/submissions` moderation queue.
//!
//! Every create and edit goes through here: authors propose, moderators
//! approve, reject, or hold.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use folio_core::moderation::ReviewAction;
use folio_core::types::DbId;
use folio_db::models::submission::Submission;
use folio_engine::moderation::SubmitRequest;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::middleware::rbac::RequireModerator;
use crate::query::SubmissionListParams;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub action: ReviewAction,
    #[serde(default)]
    pub reason: Option<String>,
}

/// POST /api/v1/submissions
///
/// Anonymous callers may propose only when `ANONYMOUS_CAN_EDIT` is set.
pub async fn submit(
    State(state): State<AppState>,
    caller: MaybeAuthUser,
    Json(input): Json<SubmitRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Submission>>)> {
    let submission = state.engine.submit(input, &caller.0).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: submission })))
}

/// GET /api/v1/submissions
///
/// Newest first, optionally filtered by `?status=`.
pub async fn list_submissions(
    State(state): State<AppState>,
    RequireModerator(user): RequireModerator,
    Query(params): Query<SubmissionListParams>,
) -> AppResult<Json<DataResponse<Vec<Submission>>>> {
    let items = state
        .engine
        .list_submissions(params.status, params.limit, params.offset, &user.actor)
        .await?;
    Ok(Json(DataResponse { data: items }))
}

/// GET /api/v1/submissions/{id}
///
/// Visible to its author and to moderators.
pub async fn get_submission(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Submission>>> {
    let submission = state.engine.get_submission(id, &user.actor).await?;
    Ok(Json(DataResponse { data: submission }))
}

/// POST /api/v1/submissions/{id}/review
///
/// Returns 409 `ALREADY_RESOLVED` when the submission is already approved or
/// rejected.
pub async fn review(
    State(state): State<AppState>,
    RequireModerator(user): RequireModerator,
    Path(id): Path<DbId>,
    Json(input): Json<ReviewRequest>,
) -> AppResult<Json<DataResponse<Submission>>> {
    let submission = state
        .engine
        .review(id, input.action, &user.actor, input.reason)
        .await?;
    Ok(Json(DataResponse { data: submission }))
}
