//! Repository for the `submissions` table.
//!
//! Every status change is conditional on the status (and claim) the caller
//! observed, so two reviewers racing on one submission cannot both win.

use folio_core::moderation::SubmissionStatus;
use folio_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::submission::{NewSubmission, ReviewClaim, ReviewRecord, Submission};

/// Column list for `submissions` queries.
const COLUMNS: &str = "id, submission_type, status, target_title, target_slug, namespace, \
    page_id, author, author_id, content, summary, edit_summary, categories, tags, \
    is_minor_edit, reason, reviewed_by, reviewer_id, reviewed_at, claimed_by, claimed_at, \
    created_at, updated_at";

pub struct SubmissionRepo;

impl SubmissionRepo {
    pub async fn create(pool: &PgPool, input: &NewSubmission) -> Result<Submission, sqlx::Error> {
        let query = format!(
            "INSERT INTO submissions
                (submission_type, target_title, target_slug, namespace, page_id,
                 author, author_id, content, summary, edit_summary, categories, tags,
                 is_minor_edit, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Submission>(&query)
            .bind(input.submission_type.as_str())
            .bind(&input.target_title)
            .bind(&input.target_slug)
            .bind(&input.namespace)
            .bind(input.page_id)
            .bind(&input.author)
            .bind(input.author_id)
            .bind(&input.content)
            .bind(&input.summary)
            .bind(&input.edit_summary)
            .bind(&input.categories)
            .bind(&input.tags)
            .bind(input.is_minor_edit)
            .bind(input.now)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Submission>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM submissions WHERE id = $1");
        sqlx::query_as::<_, Submission>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List submissions newest first, optionally filtered by status.
    pub async fn list(
        pool: &PgPool,
        status: Option<SubmissionStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Submission>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM submissions
             WHERE ($1::TEXT IS NULL OR status = $1)
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Submission>(&query)
            .bind(status.map(|s| s.as_str()))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Claim a reviewable submission for approval.
    ///
    /// Succeeds only when the submission is unclaimed or its claim is older
    /// than `stale_before`. A live claim blocks its own holder too.
    pub async fn claim(
        pool: &PgPool,
        id: DbId,
        claimer: DbId,
        now: Timestamp,
        stale_before: Timestamp,
    ) -> Result<Option<Submission>, sqlx::Error> {
        let query = format!(
            "UPDATE submissions SET claimed_by = $2, claimed_at = $3, updated_at = $3
             WHERE id = $1 AND status IN ('pending', 'onhold')
               AND (claimed_by IS NULL OR claimed_at < $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Submission>(&query)
            .bind(id)
            .bind(claimer)
            .bind(now)
            .bind(stale_before)
            .fetch_optional(pool)
            .await
    }

    /// Drop `claim` without changing the status. A newer claim is left alone.
    pub async fn release_claim(
        pool: &PgPool,
        id: DbId,
        claim: &ReviewClaim,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE submissions SET claimed_by = NULL, claimed_at = NULL
             WHERE id = $1 AND claimed_by = $2 AND claimed_at = $3",
        )
        .bind(id)
        .bind(claim.claimer)
        .bind(claim.claimed_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark a claimed submission approved. Only lands while `claim` is still
    /// the claim on the row.
    pub async fn finalize_approval(
        pool: &PgPool,
        id: DbId,
        claim: &ReviewClaim,
        review: &ReviewRecord,
        page_id: Option<DbId>,
    ) -> Result<Option<Submission>, sqlx::Error> {
        let query = format!(
            "UPDATE submissions SET
                status = $2, reviewed_by = $3, reviewer_id = $4, reason = $5,
                reviewed_at = $6, page_id = COALESCE($7, page_id),
                claimed_by = NULL, claimed_at = NULL, updated_at = $6
             WHERE id = $1 AND claimed_by = $8 AND claimed_at = $9
               AND status IN ('pending', 'onhold')
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Submission>(&query)
            .bind(id)
            .bind(review.status.as_str())
            .bind(&review.reviewed_by)
            .bind(review.reviewer_id)
            .bind(&review.reason)
            .bind(review.reviewed_at)
            .bind(page_id)
            .bind(claim.claimer)
            .bind(claim.claimed_at)
            .fetch_optional(pool)
            .await
    }

    /// Reject or hold a submission still in `expected` status with no live
    /// approval claim on it.
    pub async fn resolve(
        pool: &PgPool,
        id: DbId,
        expected: SubmissionStatus,
        review: &ReviewRecord,
        stale_before: Timestamp,
    ) -> Result<Option<Submission>, sqlx::Error> {
        let query = format!(
            "UPDATE submissions SET
                status = $3, reviewed_by = $4, reviewer_id = $5, reason = $6,
                reviewed_at = $7, claimed_by = NULL, claimed_at = NULL, updated_at = $7
             WHERE id = $1 AND status = $2
               AND (claimed_by IS NULL OR claimed_at < $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Submission>(&query)
            .bind(id)
            .bind(expected.as_str())
            .bind(review.status.as_str())
            .bind(&review.reviewed_by)
            .bind(review.reviewer_id)
            .bind(&review.reason)
            .bind(review.reviewed_at)
            .bind(stale_before)
            .fetch_optional(pool)
            .await
    }
}
