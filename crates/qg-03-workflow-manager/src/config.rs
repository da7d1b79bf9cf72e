//! Workflow manager configuration.

use shared_types::{ApprovalConfig, ChainId};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkflowConfig {
    /// Chain the deployment serves.
    pub chain_id: ChainId,
    /// Ceiling on pending workflows.
    pub max_pending_workflows: usize,
    /// Workflow-level expiration, measured from creation.
    pub default_expiration: Duration,
    /// How long a terminal workflow is kept before the sweep deletes it.
    pub terminal_retention: Duration,
    /// Period of the background sweep.
    pub cleanup_interval: Duration,
}

impl WorkflowConfig {
    pub fn expiration_ms(&self) -> u64 {
        saturating_ms(self.default_expiration)
    }

    pub fn retention_ms(&self) -> u64 {
        saturating_ms(self.terminal_retention)
    }
}

fn saturating_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl From<&ApprovalConfig> for WorkflowConfig {
    fn from(config: &ApprovalConfig) -> Self {
        Self {
            chain_id: config.chain_id,
            max_pending_workflows: config.max_pending_workflows,
            default_expiration: Duration::from_secs(
                config.default_timeout_minutes.saturating_mul(60),
            ),
            terminal_retention: config.terminal_retention,
            cleanup_interval: config.cleanup_interval,
        }
    }
}
