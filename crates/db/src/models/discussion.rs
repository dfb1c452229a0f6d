//! Page discussion comments.

use folio_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `page_discussions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Discussion {
    pub id: DbId,
    pub page_id: DbId,
    pub author: String,
    pub author_id: DbId,
    pub body: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct NewDiscussion {
    pub page_id: DbId,
    pub author: String,
    pub author_id: DbId,
    pub body: String,
    pub now: Timestamp,
}
