//! Page watchers.

use folio_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A page on a user's watchlist.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WatchedPage {
    pub page_id: DbId,
    pub title: String,
    pub slug: String,
    pub namespace: String,
    pub current_revision: i32,
    pub last_edit_date: Timestamp,
    pub watched_at: Timestamp,
}
