//! # Inbound Ports (Driving Ports / API)

use crate::domain::entities::{CleanupReport, RuleProgress, WorkflowState, WorkflowStats};
use crate::domain::errors::WorkflowError;
use qg_02_signature_verification::ApprovalSignature;
use serde_json::Value;
use shared_types::{Address, ApprovalContext, ChainId, Timestamp};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Workflow lifecycle API. Implementations must be thread-safe.
pub trait WorkflowManagerApi: Send + Sync {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Open a workflow for `context` against every matching rule.
    fn create_workflow(&self, context: ApprovalContext) -> Result<WorkflowState, WorkflowError>;

    /// Record an approval signed for the workflow's own chain.
    fn submit_approval(
        &self,
        workflow_id: Uuid,
        approver: Address,
        signature: ApprovalSignature,
        metadata: Option<BTreeMap<String, Value>>,
    ) -> Result<WorkflowState, WorkflowError>;

    /// Record an approval signed on `source_chain_id`.
    fn submit_cross_chain_approval(
        &self,
        workflow_id: Uuid,
        approver: Address,
        source_chain_id: ChainId,
        signature: ApprovalSignature,
        metadata: Option<BTreeMap<String, Value>>,
    ) -> Result<WorkflowState, WorkflowError>;

    /// Reject immediately. One authorized approver suffices.
    fn reject_workflow(
        &self,
        workflow_id: Uuid,
        approver: Address,
        reason: Option<String>,
    ) -> Result<WorkflowState, WorkflowError>;

    // =========================================================================
    // Reads (snapshots)
    // =========================================================================

    fn get_workflow(&self, workflow_id: Uuid) -> Option<WorkflowState>;

    fn get_pending_workflows(&self) -> Vec<WorkflowState>;

    /// Pending workflows `approver` may approve and has not yet approved.
    fn get_approver_pending_workflows(&self, approver: &Address) -> Vec<WorkflowState>;

    fn get_all_workflows(&self) -> Vec<WorkflowState>;

    fn stats(&self) -> WorkflowStats;

    fn approval_progress(&self, workflow_id: Uuid) -> Result<Vec<RuleProgress>, WorkflowError>;

    /// The exact bytes `approver` must sign to approve `workflow_id`.
    fn approval_message(
        &self,
        workflow_id: Uuid,
        approver: &Address,
        signed_at: Timestamp,
    ) -> Result<Vec<u8>, WorkflowError>;

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Expire overdue pending workflows and delete old terminal ones.
    fn cleanup_expired_workflows(&self) -> CleanupReport;
}
