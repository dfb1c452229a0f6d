//! Handlers for the `/pages/{key}/lock` resource.
//!
//! Locks are advisory: they block other users' proposals, never reads.

use axum::extract::{Path, State};
use axum::Json;
use folio_core::edit_lock::LockStatus;

use crate::error::AppResult;
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/pages/{key}/lock
///
/// An expired lock is reported as unlocked.
pub async fn lock_status(
    State(state): State<AppState>,
    caller: MaybeAuthUser,
    Path(key): Path<String>,
) -> AppResult<Json<DataResponse<LockStatus>>> {
    let status = state.engine.lock_status(&key, Some(&caller.0)).await?;
    Ok(Json(DataResponse { data: status }))
}

/// POST /api/v1/pages/{key}/lock
///
/// Returns 409 `LOCK_HELD` with the holder and expiry when another user
/// holds an active lock.
pub async fn acquire(
    State(state): State<AppState>,
    user: AuthUser,
    Path(key): Path<String>,
) -> AppResult<Json<DataResponse<LockStatus>>> {
    let status = state.engine.acquire_lock(&key, &user.actor).await?;
    Ok(Json(DataResponse { data: status }))
}

/// PUT /api/v1/pages/{key}/lock
pub async fn renew(
    State(state): State<AppState>,
    user: AuthUser,
    Path(key): Path<String>,
) -> AppResult<Json<DataResponse<LockStatus>>> {
    let status = state.engine.renew_lock(&key, &user.actor).await?;
    Ok(Json(DataResponse { data: status }))
}

/// DELETE /api/v1/pages/{key}/lock
///
/// Holders release their own lock; moderators may clear anyone's.
pub async fn release(
    State(state): State<AppState>,
    user: AuthUser,
    Path(key): Path<String>,
) -> AppResult<Json<DataResponse<LockStatus>>> {
    let status = state.engine.release_lock(&key, &user.actor).await?;
    Ok(Json(DataResponse { data: status }))
}
