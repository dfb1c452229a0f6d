//! Background repair: expired lock cleanup and stalled move recovery.

use chrono::Duration;
use folio_core::page_move::MOVE_REPAIR_AFTER_SECS;
use serde::Serialize;

use crate::engine::Engine;
use crate::error::EngineResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub locks_cleared: u64,
    pub moves_resumed: usize,
    pub moves_failed: usize,
}

impl Engine {
    /// One repair pass.
    ///
    /// Clears lock fields whose expiry has passed (readers already treat
    /// them as unlocked) and re-runs moves whose marker has been `started`
    /// for longer than [`MOVE_REPAIR_AFTER_SECS`].
    pub async fn repair(&self) -> EngineResult<RepairReport> {
        let now = self.now();
        let mut report = RepairReport {
            locks_cleared: self.store.clear_expired_locks(now).await?,
            ..RepairReport::default()
        };

        let stalled = self
            .store
            .list_stalled_moves(now - Duration::seconds(MOVE_REPAIR_AFTER_SECS))
            .await?;
        for marker in stalled {
            match self.run_move(&marker).await {
                Ok(_) => {
                    tracing::info!(move_id = marker.id, "Stalled move resumed");
                    report.moves_resumed += 1;
                }
                Err(e) => {
                    tracing::warn!(move_id = marker.id, error = %e, "Stalled move still failing");
                    report.moves_failed += 1;
                }
            }
        }

        if report != RepairReport::default() {
            tracing::info!(
                locks_cleared = report.locks_cleared,
                moves_resumed = report.moves_resumed,
                moves_failed = report.moves_failed,
                "Repair pass finished"
            );
        }
        Ok(report)
    }
}
