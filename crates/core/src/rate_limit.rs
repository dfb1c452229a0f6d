//! Sliding-window edit throttling.
//!
//! Buckets live in the shared store; this module only holds the window
//! arithmetic so the in-memory store and the SQL upsert agree on it.

use chrono::Duration;

use crate::error::CoreError;
use crate::types::Timestamp;

/// Length of one throttling window.
pub const RATE_WINDOW_SECS: i64 = 60;

/// Default number of edit actions allowed per window.
pub const DEFAULT_EDIT_RATE_LIMIT: i64 = 20;

pub fn rate_window() -> Duration {
    Duration::seconds(RATE_WINDOW_SECS)
}

/// A bucket's state after recording a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    pub window_start: Timestamp,
    pub hits: i64,
}

impl RateWindow {
    /// Record one hit at `now`. A window older than [`RATE_WINDOW_SECS`]
    /// restarts at `now`.
    pub fn record(current: Option<RateWindow>, now: Timestamp) -> RateWindow {
        match current {
            Some(w) if now - w.window_start < rate_window() => RateWindow {
                window_start: w.window_start,
                hits: w.hits + 1,
            },
            _ => RateWindow {
                window_start: now,
                hits: 1,
            },
        }
    }

    /// `RateLimited` once the bucket holds more than `limit` hits.
    pub fn check(&self, limit: i64, now: Timestamp) -> Result<(), CoreError> {
        if self.hits <= limit {
            return Ok(());
        }
        let reset_at = self.window_start + rate_window();
        Err(CoreError::RateLimited {
            retry_after_secs: (reset_at - now).num_seconds().max(1),
        })
    }
}
