//! Route definitions for the `/submissions` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::submissions;
use crate::state::AppState;

/// Routes mounted at `/submissions`.
///
/// ```text
/// GET    /                 -> list_submissions  (?status=&limit=&offset=)
/// POST   /                 -> submit
/// GET    /{id}             -> get_submission
/// POST   /{id}/review      -> review
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(submissions::list_submissions).post(submissions::submit),
        )
        .route("/{id}", get(submissions::get_submission))
        .route("/{id}/review", post(submissions::review))
}
