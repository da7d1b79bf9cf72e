//! Periodic expiry sweep.

use crate::ports::inbound::WorkflowManagerApi;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Run `cleanup_expired_workflows` every `interval` until the handle is
/// aborted. The first sweep runs immediately.
///
/// Must be called from within a tokio runtime.
pub fn spawn_cleanup_task<M>(manager: Arc<M>, interval: Duration) -> JoinHandle<()>
where
    M: WorkflowManagerApi + ?Sized + 'static,
{
    info!(interval_ms = interval.as_millis() as u64, "Starting workflow cleanup task");
    tokio::spawn(async move {
        let mut cleanup_interval = tokio::time::interval(interval);
        cleanup_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            cleanup_interval.tick().await;
            let report = manager.cleanup_expired_workflows();
            if report.expired > 0 || report.removed > 0 {
                debug!(
                    expired = report.expired,
                    removed = report.removed,
                    "Cleanup tick"
                );
            }
        }
    })
}
