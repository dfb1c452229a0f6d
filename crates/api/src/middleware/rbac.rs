//! Role-based access control extractors.
//!
//! The engine enforces every permission itself; these extractors reject
//! obviously unauthorized requests before a handler runs.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use folio_core::error::CoreError;
use folio_core::policy::can_review;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires an unbanned `moderator`, `admin`, or `owner`. Rejects with 403
/// Forbidden otherwise.
///
/// ```ignore
/// async fn queue(RequireModerator(user): RequireModerator) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireModerator(pub AuthUser);

impl FromRequestParts<AppState> for RequireModerator {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !can_review(&user.actor) {
            return Err(AppError::Core(CoreError::Forbidden(
                "Moderator role required".into(),
            )));
        }
        Ok(RequireModerator(user))
    }
}
