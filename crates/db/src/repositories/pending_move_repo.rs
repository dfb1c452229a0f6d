//! Repository for the `pending_moves` table.

use folio_core::page_move::MoveState;
use folio_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::pending_move::{NewPendingMove, PendingMove};

const COLUMNS: &str = "id, source_page_id, from_title, to_title, to_slug, actor, actor_id, \
    reason, state, created_at, completed_at";

pub struct PendingMoveRepo;

impl PendingMoveRepo {
    /// Insert a `started` marker.
    ///
    /// Fails with a `uq_pending_moves_*` violation when a move of the same
    /// source, or into the same slug, is already in flight.
    pub async fn create(pool: &PgPool, input: &NewPendingMove) -> Result<PendingMove, sqlx::Error> {
        let query = format!(
            "INSERT INTO pending_moves
                (source_page_id, from_title, to_title, to_slug, actor, actor_id, reason, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PendingMove>(&query)
            .bind(input.source_page_id)
            .bind(&input.from_title)
            .bind(&input.to_title)
            .bind(&input.to_slug)
            .bind(&input.actor)
            .bind(input.actor_id)
            .bind(&input.reason)
            .bind(input.now)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<PendingMove>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pending_moves WHERE id = $1");
        sqlx::query_as::<_, PendingMove>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Move a `started` marker to a final state. Returns `false` if the
    /// marker had already left `started`.
    pub async fn finish(
        pool: &PgPool,
        id: DbId,
        state: MoveState,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE pending_moves SET state = $2, completed_at = $3
             WHERE id = $1 AND state = 'started'",
        )
        .bind(id)
        .bind(state.as_str())
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// `started` markers created before `before`, oldest first.
    pub async fn list_stalled(
        pool: &PgPool,
        before: Timestamp,
    ) -> Result<Vec<PendingMove>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM pending_moves
             WHERE state = 'started' AND created_at < $1
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, PendingMove>(&query)
            .bind(before)
            .fetch_all(pool)
            .await
    }
}
