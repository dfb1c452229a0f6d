//! Handlers for page views, protection, and moves.
//!
//! `{key}` is a slug or a title; titles are slugified before falling back to
//! an exact title match.

use axum::extract::{Path, State};
use axum::Json;
use folio_engine::directory::{MoveRequest, ProtectRequest};
use folio_engine::views::{MoveOutcome, PageView, ProtectionView};

use crate::error::AppResult;
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/pages/{key}
pub async fn get_page(
    State(state): State<AppState>,
    caller: MaybeAuthUser,
    Path(key): Path<String>,
) -> AppResult<Json<DataResponse<PageView>>> {
    let view = state.engine.get_page(&key, Some(&caller.0)).await?;
    Ok(Json(DataResponse { data: view }))
}

/// GET /api/v1/pages/{key}/protection
pub async fn get_protection(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<DataResponse<ProtectionView>>> {
    let protection = state.engine.get_protection(&key).await?;
    Ok(Json(DataResponse { data: protection }))
}

/// PUT /api/v1/pages/{key}/protection
///
/// Moderators and holders of `can_protect` only. Omitted fields keep their
/// stored values.
pub async fn set_protection(
    State(state): State<AppState>,
    user: AuthUser,
    Path(key): Path<String>,
    Json(input): Json<ProtectRequest>,
) -> AppResult<Json<DataResponse<ProtectionView>>> {
    let protection = state.engine.protect(&key, input, &user.actor).await?;
    Ok(Json(DataResponse { data: protection }))
}

/// POST /api/v1/pages/{key}/move
///
/// Renames the page to `to`, leaving a redirect behind. Moderators only.
pub async fn move_page(
    State(state): State<AppState>,
    user: AuthUser,
    Path(key): Path<String>,
    Json(input): Json<MoveRequest>,
) -> AppResult<Json<DataResponse<MoveOutcome>>> {
    let outcome = state.engine.move_page(&key, input, &user.actor).await?;
    Ok(Json(DataResponse { data: outcome }))
}
