//! Repository for the `page_watchers` table.

use folio_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::watcher::WatchedPage;

pub struct WatcherRepo;

impl WatcherRepo {
    /// Add a watcher. Returns `false` if the user was already watching.
    pub async fn add(
        pool: &PgPool,
        page_id: DbId,
        user_id: DbId,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO page_watchers (page_id, user_id, created_at) VALUES ($1, $2, $3)
             ON CONFLICT DO NOTHING",
        )
        .bind(page_id)
        .bind(user_id)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove a watcher. Returns `false` if the user was not watching.
    pub async fn remove(pool: &PgPool, page_id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM page_watchers WHERE page_id = $1 AND user_id = $2")
            .bind(page_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// User ids watching a page, in the order they started watching.
    pub async fn list_for_page(pool: &PgPool, page_id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT user_id FROM page_watchers WHERE page_id = $1 ORDER BY created_at, user_id",
        )
        .bind(page_id)
        .fetch_all(pool)
        .await
    }

    /// Live pages a user watches, most recently edited first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<WatchedPage>, sqlx::Error> {
        sqlx::query_as::<_, WatchedPage>(
            "SELECT p.id AS page_id, p.title, p.slug, p.namespace, p.current_revision,
                    p.last_edit_date, w.created_at AS watched_at
             FROM page_watchers w
             JOIN pages p ON p.id = w.page_id
             WHERE w.user_id = $1 AND NOT p.is_deleted
             ORDER BY p.last_edit_date DESC, p.id
             LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }
}
