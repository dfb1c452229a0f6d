//! Repository for the `rate_limit_buckets` table.

use folio_core::rate_limit::{RateWindow, RATE_WINDOW_SECS};
use folio_core::types::Timestamp;
use sqlx::PgPool;

pub struct RateLimitRepo;

impl RateLimitRepo {
    /// Record one hit for `actor_key` at `now` and return the bucket after
    /// the hit. A window older than [`RATE_WINDOW_SECS`] restarts at `now`.
    pub async fn hit(pool: &PgPool, actor_key: &str, now: Timestamp) -> Result<RateWindow, sqlx::Error> {
        let (window_start, hits): (Timestamp, i64) = sqlx::query_as(
            "INSERT INTO rate_limit_buckets AS b (actor_key, window_start, hits)
             VALUES ($1, $2, 1)
             ON CONFLICT (actor_key) DO UPDATE SET
                window_start = CASE
                    WHEN b.window_start > $2 - make_interval(secs => $3) THEN b.window_start
                    ELSE EXCLUDED.window_start END,
                hits = CASE
                    WHEN b.window_start > $2 - make_interval(secs => $3) THEN b.hits + 1
                    ELSE 1 END
             RETURNING window_start, hits",
        )
        .bind(actor_key)
        .bind(now)
        .bind(RATE_WINDOW_SECS as f64)
        .fetch_one(pool)
        .await?;
        Ok(RateWindow { window_start, hits })
    }
}
