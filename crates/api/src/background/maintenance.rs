//! Periodic engine maintenance.
//!
//! Clears expired edit locks and resumes page moves that stalled between
//! their steps. Readers already treat expired locks as unlocked, so this
//! only tidies storage; the move repair is what restores consistency.

use std::time::Duration;

use folio_engine::repair::RepairReport;
use folio_engine::Engine;
use tokio_util::sync::CancellationToken;

/// Run the maintenance loop every `interval` until `cancel` is triggered.
pub async fn run(engine: Engine, interval: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = interval.as_secs(), "Maintenance job started");

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Maintenance job stopping");
                break;
            }
            _ = ticker.tick() => {
                match engine.repair().await {
                    Ok(report) if report == RepairReport::default() => {
                        tracing::debug!("Maintenance: nothing to repair");
                    }
                    Ok(report) => {
                        tracing::info!(
                            locks_cleared = report.locks_cleared,
                            moves_resumed = report.moves_resumed,
                            moves_failed = report.moves_failed,
                            "Maintenance: repair pass finished",
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Maintenance: repair pass failed");
                    }
                }
            }
        }
    }
}
