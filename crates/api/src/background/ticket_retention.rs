//! Periodic cleanup of finished propagation tickets.
//!
//! Tickets live in memory on the [`PropagationTracker`]. This loop drops the
//! terminal ones once they are older than the retention period so the map
//! does not grow without bound.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::documents::PropagationTracker;

/// Default retention period: 1 hour.
const DEFAULT_RETENTION_SECS: u64 = 3600;

/// How often the cleanup job runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Run the ticket retention loop until `cancel` is triggered.
///
/// The retention period comes from `PROPAGATION_RETENTION_SECS`.
pub async fn run(tracker: Arc<PropagationTracker>, cancel: CancellationToken) {
    let retention_secs: u64 = std::env::var("PROPAGATION_RETENTION_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_RETENTION_SECS);
    let retention = Duration::from_secs(retention_secs);

    tracing::info!(
        retention_secs,
        interval_secs = CLEANUP_INTERVAL.as_secs(),
        "Propagation ticket retention job started"
    );

    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Propagation ticket retention job stopping");
                break;
            }
            _ = interval.tick() => {
                let pruned = tracker.prune_finished(retention).await;
                if pruned > 0 {
                    tracing::info!(pruned, "Ticket retention: dropped finished tickets");
                } else {
                    tracing::debug!("Ticket retention: nothing to drop");
                }
            }
        }
    }
}
