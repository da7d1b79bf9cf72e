//! # Integration Flows
//!
//! Everything here runs through [`ApprovalGate`] with real secp256k1
//! signatures and a manual clock.
//!
//! [`ApprovalGate`]: qg_03_workflow_manager::ApprovalGate

pub mod approval_flows;
pub mod concurrency;
pub mod cross_chain;

#[cfg(test)]
pub(crate) mod harness {
    use crate::fixtures::{Approver, T0};
    use qg_03_workflow_manager::{ApprovalGate, WorkflowError, WorkflowManagerApi, WorkflowState};
    use shared_types::{ApprovalConfig, ManualTimeSource, TimeSource};
    use std::sync::Arc;
    use uuid::Uuid;

    pub struct Harness {
        pub gate: ApprovalGate,
        pub clock: Arc<ManualTimeSource>,
    }

    impl Harness {
        pub fn new(config: ApprovalConfig) -> Self {
            let clock = Arc::new(ManualTimeSource::new(T0));
            let gate = ApprovalGate::with_clock(config, Arc::clone(&clock) as Arc<dyn TimeSource>)
                .expect("valid config");
            Self { gate, clock }
        }

        pub fn on_chain(chain_id: u64) -> Self {
            Self::new(ApprovalConfig::for_chain(chain_id))
        }

        /// Sign the workflow's approval message now and submit it directly.
        pub fn approve(
            &self,
            workflow_id: Uuid,
            approver: &Approver,
        ) -> Result<WorkflowState, WorkflowError> {
            let now = self.clock.now();
            let message = self
                .gate
                .workflows()
                .approval_message(workflow_id, &approver.address, now)?;
            self.gate.workflows().submit_approval(
                workflow_id,
                approver.address,
                approver.sign(&message, now),
                None,
            )
        }

        /// Sign from `source` and submit through the cross-chain path.
        pub fn approve_from(
            &self,
            workflow_id: Uuid,
            approver: &Approver,
            source: u64,
        ) -> Result<WorkflowState, WorkflowError> {
            let now = self.clock.now();
            let workflow = self
                .gate
                .workflows()
                .get_workflow(workflow_id)
                .ok_or(WorkflowError::NotFound(workflow_id))?;
            let message = self
                .gate
                .workflows()
                .approval_message(workflow_id, &approver.address, now)?;
            let signature =
                approver.sign_cross_chain(source, workflow.context.chain_id, &message, now);
            self.gate.workflows().submit_cross_chain_approval(
                workflow_id,
                approver.address,
                source,
                signature,
                None,
            )
        }
    }
}
