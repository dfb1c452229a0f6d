//! Repository for the `audit_events` table.

use folio_core::types::DbId;
use sqlx::PgPool;

use crate::models::audit_event::{AuditEvent, NewAuditEvent};

const COLUMNS: &str =
    "id, event_type, source_entity_type, source_entity_id, actor_user_id, payload, created_at";

pub struct AuditEventRepo;

impl AuditEventRepo {
    /// Insert a new event row, returning the generated ID.
    pub async fn insert(pool: &PgPool, input: &NewAuditEvent) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO audit_events
                (event_type, source_entity_type, source_entity_id, actor_user_id, payload, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id",
        )
        .bind(&input.event_type)
        .bind(&input.source_entity_type)
        .bind(input.source_entity_id)
        .bind(input.actor_user_id)
        .bind(&input.payload)
        .bind(input.created_at)
        .fetch_one(pool)
        .await
    }

    /// List recent events ordered newest-first.
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<AuditEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audit_events ORDER BY created_at DESC, id DESC LIMIT $1"
        );
        sqlx::query_as::<_, AuditEvent>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
