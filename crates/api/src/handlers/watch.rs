//! Handlers for page watching and the caller's watchlist.

use axum::extract::{Path, Query, State};
use axum::Json;
use folio_db::models::watcher::WatchedPage;
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WatchResult {
    pub watching: bool,
    /// Whether this request changed anything.
    pub changed: bool,
}

/// POST /api/v1/pages/{key}/watch
pub async fn watch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(key): Path<String>,
) -> AppResult<Json<DataResponse<WatchResult>>> {
    let changed = state.engine.watch(&key, &user.actor).await?;
    Ok(Json(DataResponse {
        data: WatchResult {
            watching: true,
            changed,
        },
    }))
}

/// DELETE /api/v1/pages/{key}/watch
pub async fn unwatch(
    State(state): State<AppState>,
    user: AuthUser,
    Path(key): Path<String>,
) -> AppResult<Json<DataResponse<WatchResult>>> {
    let changed = state.engine.unwatch(&key, &user.actor).await?;
    Ok(Json(DataResponse {
        data: WatchResult {
            watching: false,
            changed,
        },
    }))
}

/// GET /api/v1/watchlist
pub async fn watchlist(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<WatchedPage>>>> {
    let pages = state
        .engine
        .list_watched(&user.actor, params.limit, params.offset)
        .await?;
    Ok(Json(DataResponse { data: pages }))
}
