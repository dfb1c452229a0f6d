//! Repository for the `pages` table.
//!
//! Lock and protection writes are single conditional `UPDATE`s against the
//! page row; page creation inserts the row, revision 1, and the initial
//! watchers in one transaction.

use folio_core::edit_lock::{EditLock, LockFingerprint};
use folio_core::policy::Protection;
use folio_core::revision::content_length;
use folio_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::page::{role_names, NewPage, Page};

/// Column list for `pages` queries.
pub(crate) const PAGE_COLUMNS: &str = "id, title, slug, namespace, content, summary, \
    categories, tags, is_redirect, redirect_target, is_deleted, \
    current_revision, content_length, edits, last_editor, last_editor_id, \
    last_edit_date, last_edit_summary, \
    protection_level, protection_reason, protected_by, protected_by_id, \
    protected_until, allowed_roles, \
    is_locked, locked_by, locked_by_id, lock_start_time, lock_expiry, lock_reason, \
    created_from_submission, created_by_move, created_at, updated_at";

/// Provides reads and conditional writes for pages.
pub struct PageRepo;

impl PageRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Page>, sqlx::Error> {
        let query = format!("SELECT {PAGE_COLUMNS} FROM pages WHERE id = $1");
        sqlx::query_as::<_, Page>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a live (not deleted) page by slug.
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Page>, sqlx::Error> {
        let query = format!("SELECT {PAGE_COLUMNS} FROM pages WHERE slug = $1 AND NOT is_deleted");
        sqlx::query_as::<_, Page>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Find a live page by exact title.
    pub async fn find_by_title(pool: &PgPool, title: &str) -> Result<Option<Page>, sqlx::Error> {
        let query =
            format!("SELECT {PAGE_COLUMNS} FROM pages WHERE title = $1 AND NOT is_deleted");
        sqlx::query_as::<_, Page>(&query)
            .bind(title)
            .fetch_optional(pool)
            .await
    }

    /// Find the page an approved create submission produced.
    pub async fn find_by_submission(
        pool: &PgPool,
        submission_id: DbId,
    ) -> Result<Option<Page>, sqlx::Error> {
        let query =
            format!("SELECT {PAGE_COLUMNS} FROM pages WHERE created_from_submission = $1");
        sqlx::query_as::<_, Page>(&query)
            .bind(submission_id)
            .fetch_optional(pool)
            .await
    }

    /// Find the destination page a move produced.
    pub async fn find_by_move(pool: &PgPool, move_id: DbId) -> Result<Option<Page>, sqlx::Error> {
        let query = format!("SELECT {PAGE_COLUMNS} FROM pages WHERE created_by_move = $1");
        sqlx::query_as::<_, Page>(&query)
            .bind(move_id)
            .fetch_optional(pool)
            .await
    }

    /// Create a page, its first revision, and its initial watchers.
    ///
    /// Title and slug uniqueness among live pages is enforced by the
    /// `uq_pages_slug` / `uq_pages_title` partial indexes.
    pub async fn create(pool: &PgPool, input: &NewPage) -> Result<Page, sqlx::Error> {
        let length = content_length(&input.content);
        let protection = &input.protection;
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO pages
                (title, slug, namespace, content, summary, categories, tags,
                 current_revision, content_length, edits,
                 last_editor, last_editor_id, last_edit_date, last_edit_summary,
                 protection_level, protection_reason, protected_by, protected_by_id,
                 protected_until, allowed_roles,
                 created_from_submission, created_by_move,
                 is_redirect, redirect_target, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, 1, $8, 1, $9, $10, $11, $12,
                     $13, $14, $15, $16, $17, $18, $19, $20,
                     $21::TEXT IS NOT NULL, $21, $11, $11)
             RETURNING {PAGE_COLUMNS}"
        );
        let page = sqlx::query_as::<_, Page>(&query)
            .bind(&input.title)
            .bind(&input.slug)
            .bind(&input.namespace)
            .bind(&input.content)
            .bind(&input.summary)
            .bind(&input.categories)
            .bind(&input.tags)
            .bind(length)
            .bind(&input.author)
            .bind(input.author_id)
            .bind(input.now)
            .bind(&input.edit_summary)
            .bind(protection.level.as_str())
            .bind(&protection.reason)
            .bind(&protection.protected_by)
            .bind(protection.protected_by_id)
            .bind(protection.protected_until)
            .bind(role_names(&protection.allowed_roles))
            .bind(input.created_from_submission)
            .bind(input.created_by_move)
            .bind(&input.redirect_target)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO revisions
                (page_id, revision_number, content, summary, author, author_id, edit_type,
                 is_minor_edit, content_length, size_change, submission_id, created_at)
             VALUES ($1, 1, $2, $3, $4, $5, $6, $7, $8, 0, $9, $10)",
        )
            .bind(page.id)
            .bind(&input.content)
            .bind(&input.edit_summary)
            .bind(&input.author)
            .bind(input.author_id)
            .bind(input.edit_type.as_str())
            .bind(input.is_minor_edit)
            .bind(length)
            .bind(input.created_from_submission)
            .bind(input.now)
            .execute(&mut *tx)
            .await?;

        if !input.watchers.is_empty() {
            sqlx::query(
                "INSERT INTO page_watchers (page_id, user_id, created_at)
                 SELECT $1, UNNEST($2::BIGINT[]), $3
                 ON CONFLICT DO NOTHING",
            )
            .bind(page.id)
            .bind(&input.watchers)
            .bind(input.now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(page)
    }

    /// Replace the lock fields if the stored lock still matches `expected`.
    ///
    /// Returns `false` when another writer changed the lock first.
    pub async fn swap_lock(
        pool: &PgPool,
        page_id: DbId,
        expected: LockFingerprint,
        lock: &EditLock,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE pages SET
                is_locked = $4, locked_by = $5, locked_by_id = $6,
                lock_start_time = $7, lock_expiry = $8, lock_reason = $9,
                updated_at = $10
             WHERE id = $1 AND NOT is_deleted
               AND (CASE WHEN is_locked THEN locked_by_id END) IS NOT DISTINCT FROM $2
               AND (CASE WHEN is_locked THEN lock_expiry END) IS NOT DISTINCT FROM $3",
        )
        .bind(page_id)
        .bind(expected.holder_id)
        .bind(expected.expiry)
        .bind(lock.is_locked)
        .bind(&lock.locked_by)
        .bind(lock.locked_by_id)
        .bind(lock.lock_start_time)
        .bind(lock.lock_expiry)
        .bind(&lock.lock_reason)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Clear lock fields on every page whose lock has expired. Returns the
    /// number of pages cleared.
    pub async fn clear_expired_locks(pool: &PgPool, now: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE pages SET
                is_locked = false, locked_by = NULL, locked_by_id = NULL,
                lock_start_time = NULL, lock_expiry = NULL, lock_reason = NULL
             WHERE is_locked AND (lock_expiry IS NULL OR lock_expiry < $1)",
        )
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Overwrite a live page's protection settings.
    pub async fn update_protection(
        pool: &PgPool,
        page_id: DbId,
        protection: &Protection,
        now: Timestamp,
    ) -> Result<Option<Page>, sqlx::Error> {
        let query = format!(
            "UPDATE pages SET
                protection_level = $2, protection_reason = $3, protected_by = $4,
                protected_by_id = $5, protected_until = $6, allowed_roles = $7,
                updated_at = $8
             WHERE id = $1 AND NOT is_deleted
             RETURNING {PAGE_COLUMNS}"
        );
        sqlx::query_as::<_, Page>(&query)
            .bind(page_id)
            .bind(protection.level.as_str())
            .bind(&protection.reason)
            .bind(&protection.protected_by)
            .bind(protection.protected_by_id)
            .bind(protection.protected_until)
            .bind(role_names(&protection.allowed_roles))
            .bind(now)
            .fetch_optional(pool)
            .await
    }
}
