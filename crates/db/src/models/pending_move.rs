//! Move markers.

use folio_core::page_move::MoveState;
use folio_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `pending_moves` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PendingMove {
    pub id: DbId,
    pub source_page_id: DbId,
    pub from_title: String,
    pub to_title: String,
    pub to_slug: String,
    pub actor: String,
    pub actor_id: DbId,
    pub reason: Option<String>,
    #[sqlx(try_from = "String")]
    pub state: MoveState,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

#[derive(Debug, Clone)]
pub struct NewPendingMove {
    pub source_page_id: DbId,
    pub from_title: String,
    pub to_title: String,
    pub to_slug: String,
    pub actor: String,
    pub actor_id: DbId,
    pub reason: Option<String>,
    pub now: Timestamp,
}
