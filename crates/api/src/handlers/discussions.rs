//! Handlers for page talk threads.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use folio_db::models::discussion::Discussion;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PostDiscussion {
    pub body: String,
}

/// GET /api/v1/pages/{key}/discussions
pub async fn list_discussions(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<Discussion>>>> {
    let items = state
        .engine
        .list_discussions(&key, params.limit, params.offset)
        .await?;
    Ok(Json(DataResponse { data: items }))
}

/// POST /api/v1/pages/{key}/discussions
pub async fn post_discussion(
    State(state): State<AppState>,
    user: AuthUser,
    Path(key): Path<String>,
    Json(input): Json<PostDiscussion>,
) -> AppResult<(StatusCode, Json<DataResponse<Discussion>>)> {
    let discussion = state
        .engine
        .post_discussion(&key, &user.actor, input.body)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: discussion })))
}
