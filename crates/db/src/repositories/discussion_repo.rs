//! Repository for the `page_discussions` table.

use folio_core::types::DbId;
use sqlx::PgPool;

use crate::models::discussion::{Discussion, NewDiscussion};

const COLUMNS: &str = "id, page_id, author, author_id, body, created_at";

pub struct DiscussionRepo;

impl DiscussionRepo {
    pub async fn create(pool: &PgPool, input: &NewDiscussion) -> Result<Discussion, sqlx::Error> {
        let query = format!(
            "INSERT INTO page_discussions (page_id, author, author_id, body, created_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Discussion>(&query)
            .bind(input.page_id)
            .bind(&input.author)
            .bind(input.author_id)
            .bind(&input.body)
            .bind(input.now)
            .fetch_one(pool)
            .await
    }

    /// Comments on a page, oldest first.
    pub async fn list_for_page(
        pool: &PgPool,
        page_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Discussion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM page_discussions WHERE page_id = $1
             ORDER BY created_at, id LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Discussion>(&query)
            .bind(page_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
