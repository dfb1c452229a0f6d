pub mod health;
pub mod pages;
pub mod submissions;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /pages/{key}                                     page view
/// /pages/{key}/lock                                status, acquire, renew, release
/// /pages/{key}/revisions                           history
/// /pages/{key}/revisions/{n}                       revision paired with n-1
/// /pages/{key}/revert/{n}                          revert (POST)
/// /pages/{key}/protection                          get, set
/// /pages/{key}/move                                move (POST)
/// /pages/{key}/watch                               watch, unwatch
/// /pages/{key}/discussions                         list, post
///
/// /watchlist                                       caller's watched pages
///
/// /submissions                                     list (moderators), submit
/// /submissions/{id}                                get
/// /submissions/{id}/review                         approve | reject | hold
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/pages", pages::router())
        .nest("/submissions", submissions::router())
        .route("/watchlist", get(handlers::watch::watchlist))
}
