//! Repository for the append-only `revisions` table.

use folio_core::revision::{RevisionQuery, RevisionSort};
use folio_core::types::DbId;
use sqlx::PgPool;

use crate::models::revision::{NewRevision, Revision, RevisionSummary};

/// Column list for full revision queries.
pub(crate) const REVISION_COLUMNS: &str = "id, page_id, revision_number, content, summary, \
    author, author_id, edit_type, is_minor_edit, content_length, size_change, \
    is_reverted, is_verified, submission_id, move_id, created_at";

/// Column list for listings (content omitted).
const SUMMARY_COLUMNS: &str = "id, page_id, revision_number, summary, author, author_id, \
    edit_type, is_minor_edit, content_length, size_change, is_reverted, is_verified, \
    created_at";

/// Shared filter for list and count queries.
const LIST_FILTER: &str = "page_id = $1 \
    AND ($2::TEXT IS NULL OR author = $2) \
    AND ($3::TEXT IS NULL OR edit_type = $3)";

pub struct RevisionRepo;

impl RevisionRepo {
    /// Append a revision and advance the page's denormalized fields.
    ///
    /// The page update is a compare-and-swap on `current_revision`; when it
    /// matches no row the transaction is rolled back and `None` returned.
    pub async fn commit(pool: &PgPool, input: &NewRevision) -> Result<Option<Revision>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE pages SET
                content = $3, content_length = $4,
                current_revision = $2 + 1, edits = edits + 1,
                last_editor = $5, last_editor_id = $6, last_edit_date = $7,
                last_edit_summary = $8,
                is_redirect = $9::TEXT IS NOT NULL, redirect_target = $9,
                summary = COALESCE($10, summary),
                categories = COALESCE($11, categories),
                tags = COALESCE($12, tags),
                updated_at = $7
             WHERE id = $1 AND current_revision = $2 AND NOT is_deleted",
        )
        .bind(input.page_id)
        .bind(input.expected_revision)
        .bind(&input.content)
        .bind(input.content_length)
        .bind(&input.author)
        .bind(input.author_id)
        .bind(input.now)
        .bind(&input.summary)
        .bind(&input.redirect_target)
        .bind(&input.page_summary)
        .bind(&input.categories)
        .bind(&input.tags)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let query = format!(
            "INSERT INTO revisions
                (page_id, revision_number, content, summary, author, author_id, edit_type,
                 is_minor_edit, content_length, size_change, submission_id, move_id, created_at)
             VALUES ($1, $2 + 1, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             RETURNING {REVISION_COLUMNS}"
        );
        let revision = sqlx::query_as::<_, Revision>(&query)
            .bind(input.page_id)
            .bind(input.expected_revision)
            .bind(&input.content)
            .bind(&input.summary)
            .bind(&input.author)
            .bind(input.author_id)
            .bind(input.edit_type.as_str())
            .bind(input.is_minor_edit)
            .bind(input.content_length)
            .bind(input.size_change)
            .bind(input.submission_id)
            .bind(input.move_id)
            .bind(input.now)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(revision))
    }

    /// List revision metadata for a page, filtered and paged.
    pub async fn list(
        pool: &PgPool,
        page_id: DbId,
        q: &RevisionQuery,
    ) -> Result<Vec<RevisionSummary>, sqlx::Error> {
        let order = match q.sort {
            RevisionSort::Newest => "DESC",
            RevisionSort::Oldest => "ASC",
        };
        let query = format!(
            "SELECT {SUMMARY_COLUMNS} FROM revisions
             WHERE {LIST_FILTER}
             ORDER BY revision_number {order}
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, RevisionSummary>(&query)
            .bind(page_id)
            .bind(&q.author)
            .bind(q.edit_type.map(|t| t.as_str()))
            .bind(q.limit)
            .bind(q.skip)
            .fetch_all(pool)
            .await
    }

    /// Count revisions matching the same filter as [`RevisionRepo::list`].
    pub async fn count(pool: &PgPool, page_id: DbId, q: &RevisionQuery) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM revisions WHERE {LIST_FILTER}");
        sqlx::query_scalar(&query)
            .bind(page_id)
            .bind(&q.author)
            .bind(q.edit_type.map(|t| t.as_str()))
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_number(
        pool: &PgPool,
        page_id: DbId,
        revision_number: i32,
    ) -> Result<Option<Revision>, sqlx::Error> {
        let query = format!(
            "SELECT {REVISION_COLUMNS} FROM revisions WHERE page_id = $1 AND revision_number = $2"
        );
        sqlx::query_as::<_, Revision>(&query)
            .bind(page_id)
            .bind(revision_number)
            .fetch_optional(pool)
            .await
    }

    /// Find the revision an approved submission produced.
    pub async fn find_by_submission(
        pool: &PgPool,
        submission_id: DbId,
    ) -> Result<Option<Revision>, sqlx::Error> {
        let query = format!("SELECT {REVISION_COLUMNS} FROM revisions WHERE submission_id = $1");
        sqlx::query_as::<_, Revision>(&query)
            .bind(submission_id)
            .fetch_optional(pool)
            .await
    }

    /// Find the redirect revision a move wrote on its source page.
    pub async fn find_by_move(pool: &PgPool, move_id: DbId) -> Result<Option<Revision>, sqlx::Error> {
        let query = format!("SELECT {REVISION_COLUMNS} FROM revisions WHERE move_id = $1");
        sqlx::query_as::<_, Revision>(&query)
            .bind(move_id)
            .fetch_optional(pool)
            .await
    }
}
