//! Route definitions for the `/pages` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{discussions, locks, pages, revisions, watch};
use crate::state::AppState;

/// Routes mounted at `/pages`.
///
/// ```text
/// GET    /{key}                    -> get_page
/// GET    /{key}/lock               -> lock_status
/// POST   /{key}/lock               -> acquire
/// PUT    /{key}/lock               -> renew
/// DELETE /{key}/lock               -> release
/// GET    /{key}/revisions          -> list_revisions
/// GET    /{key}/revisions/{n}      -> get_revision
/// POST   /{key}/revert/{n}         -> revert
/// GET    /{key}/protection         -> get_protection
/// PUT    /{key}/protection         -> set_protection
/// POST   /{key}/move               -> move_page
/// POST   /{key}/watch              -> watch
/// DELETE /{key}/watch              -> unwatch
/// GET    /{key}/discussions        -> list_discussions
/// POST   /{key}/discussions        -> post_discussion
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{key}", get(pages::get_page))
        .route(
            "/{key}/lock",
            get(locks::lock_status)
                .post(locks::acquire)
                .put(locks::renew)
                .delete(locks::release),
        )
        .route("/{key}/revisions", get(revisions::list_revisions))
        .route("/{key}/revisions/{n}", get(revisions::get_revision))
        .route("/{key}/revert/{n}", post(revisions::revert))
        .route(
            "/{key}/protection",
            get(pages::get_protection).put(pages::set_protection),
        )
        .route("/{key}/move", post(pages::move_page))
        .route("/{key}/watch", post(watch::watch).delete(watch::unwatch))
        .route(
            "/{key}/discussions",
            get(discussions::list_discussions).post(discussions::post_discussion),
        )
}
