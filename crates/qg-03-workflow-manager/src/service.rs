//! # Workflow Manager Service
//!
//! Owns every workflow behind one `RwLock`. Signature verification runs
//! outside the lock; the approval is then re-validated and committed under
//! the write lock, so concurrent approvals on one workflow serialize and
//! the quorum decision is atomic.

use crate::config::WorkflowConfig;
use crate::domain::entities::{
    Approval, CleanupReport, RuleProgress, WorkflowState, WorkflowStats, WorkflowStatus,
};
use crate::domain::errors::WorkflowError;
use crate::domain::message::approval_message;
use crate::ports::inbound::WorkflowManagerApi;
use crate::ports::outbound::{ApprovalVerifier, RuleEvaluator, SignaturePath};
use parking_lot::RwLock;
use qg_02_signature_verification::ApprovalSignature;
use qg_telemetry::metrics::{
    APPROVALS_ACCEPTED, APPROVALS_REFUSED, PENDING_WORKFLOWS, WORKFLOWS_CREATED, WORKFLOWS_PURGED,
    WORKFLOW_TRANSITIONS,
};
use serde_json::{json, Value};
use shared_types::{format_address, Address, ApprovalContext, ChainId, Timestamp, TimeSource};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

type WorkflowMap = HashMap<Uuid, WorkflowState>;

pub struct WorkflowManager {
    config: WorkflowConfig,
    rules: Arc<dyn RuleEvaluator>,
    verifier: Arc<dyn ApprovalVerifier>,
    clock: Arc<dyn TimeSource>,
    workflows: RwLock<WorkflowMap>,
}

impl WorkflowManager {
    pub fn new(
        config: WorkflowConfig,
        rules: Arc<dyn RuleEvaluator>,
        verifier: Arc<dyn ApprovalVerifier>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        info!(
            chain_id = config.chain_id,
            max_pending = config.max_pending_workflows,
            expiration_ms = config.expiration_ms(),
            "Workflow manager ready"
        );
        Self {
            config,
            rules,
            verifier,
            clock,
            workflows: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    fn check_capacity(&self, workflows: &WorkflowMap) -> Result<(), WorkflowError> {
        let pending = workflows.values().filter(|w| w.is_pending()).count();
        if pending >= self.config.max_pending_workflows {
            warn!(
                pending,
                max = self.config.max_pending_workflows,
                "Workflow capacity reached"
            );
            return Err(WorkflowError::Capacity {
                pending,
                max: self.config.max_pending_workflows,
            });
        }
        Ok(())
    }

    /// Pending and not past expiry. A pending workflow found past its
    /// expiry is moved to `expired` here.
    fn ensure_open(workflow: &mut WorkflowState, now: Timestamp) -> Result<(), WorkflowError> {
        if !workflow.is_pending() {
            return Err(WorkflowError::InvalidState {
                id: workflow.id,
                status: workflow.status,
            });
        }
        if workflow.is_past_expiry(now) {
            Self::finish(workflow, WorkflowStatus::Expired, now);
            return Err(WorkflowError::Expired(workflow.id));
        }
        Ok(())
    }

    /// Everything short of the signature that decides whether `approver`
    /// may approve now. Runs before verification and again at commit.
    fn check_approval<'a>(
        workflows: &'a mut WorkflowMap,
        workflow_id: Uuid,
        approver: &Address,
        now: Timestamp,
    ) -> Result<&'a mut WorkflowState, WorkflowError> {
        let workflow = workflows
            .get_mut(&workflow_id)
            .ok_or(WorkflowError::NotFound(workflow_id))?;
        Self::ensure_open(workflow, now)?;

        if workflow.has_approved(approver) {
            return Err(WorkflowError::DuplicateApproval {
                id: workflow_id,
                approver: format_address(approver),
            });
        }
        if !workflow.is_authorized(approver) {
            return Err(WorkflowError::UnauthorizedApprover {
                id: workflow_id,
                approver: format_address(approver),
            });
        }
        Ok(workflow)
    }

    /// Terminal transition plus its bookkeeping.
    fn finish(workflow: &mut WorkflowState, status: WorkflowStatus, now: Timestamp) -> bool {
        if !workflow.transition(status, now) {
            return false;
        }
        WORKFLOW_TRANSITIONS.with_label_values(&[status.as_str()]).inc();
        PENDING_WORKFLOWS.dec();
        info!(workflow_id = %workflow.id, status = %status, "Workflow finished");
        true
    }

    fn submit(
        &self,
        workflow_id: Uuid,
        approver: Address,
        path: SignaturePath,
        signature: ApprovalSignature,
        metadata: Option<BTreeMap<String, Value>>,
    ) -> Result<WorkflowState, WorkflowError> {
        let result = self.try_submit(workflow_id, approver, path, signature, metadata);
        match &result {
            Ok(_) => APPROVALS_ACCEPTED.inc(),
            Err(e) => {
                APPROVALS_REFUSED.with_label_values(&[e.kind()]).inc();
                debug!(
                    workflow_id = %workflow_id,
                    approver = %format_address(&approver),
                    path = path.label(),
                    reason = e.kind(),
                    "Approval refused"
                );
            }
        }
        result
    }

    fn try_submit(
        &self,
        workflow_id: Uuid,
        approver: Address,
        path: SignaturePath,
        signature: ApprovalSignature,
        metadata: Option<BTreeMap<String, Value>>,
    ) -> Result<WorkflowState, WorkflowError> {
        let (chain_id, context_digest) = {
            let mut workflows = self.workflows.write();
            let workflow =
                Self::check_approval(&mut workflows, workflow_id, &approver, self.clock.now())?;
            (workflow.context.chain_id, workflow.context.digest())
        };

        let message = approval_message(
            &workflow_id,
            &approver,
            chain_id,
            &context_digest,
            signature.timestamp,
        );
        self.verifier
            .verify_approval(chain_id, path, &message, &approver, &signature)
            .map_err(|e| {
                warn!(
                    workflow_id = %workflow_id,
                    approver = %format_address(&approver),
                    chain_id,
                    source_chain_id = ?path.source_chain_id(),
                    kind = e.kind(),
                    error = %e,
                    "Approval signature rejected"
                );
                WorkflowError::InvalidSignature
            })?;

        let now = self.clock.now();
        let mut workflows = self.workflows.write();
        let workflow = Self::check_approval(&mut workflows, workflow_id, &approver, now)?;

        let approval = Approval {
            id: Uuid::new_v4(),
            approver,
            timestamp: now,
            signature,
            source_chain_id: path.source_chain_id(),
            metadata: metadata.unwrap_or_default(),
        };
        let status = workflow.apply_approval(approval, now);
        if status == WorkflowStatus::Approved {
            WORKFLOW_TRANSITIONS
                .with_label_values(&[WorkflowStatus::Approved.as_str()])
                .inc();
            PENDING_WORKFLOWS.dec();
        }

        info!(
            workflow_id = %workflow_id,
            approver = %format_address(&approver),
            path = path.label(),
            approvals = workflow.approvals.len(),
            status = %status,
            "Approval accepted"
        );
        Ok(workflow.clone())
    }

    fn snapshot<F>(&self, filter: F) -> Vec<WorkflowState>
    where
        F: Fn(&WorkflowState) -> bool,
    {
        let mut selected: Vec<WorkflowState> = self
            .workflows
            .read()
            .values()
            .filter(|w| filter(w))
            .cloned()
            .collect();
        selected.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        selected
    }
}

impl WorkflowManagerApi for WorkflowManager {
    fn create_workflow(&self, context: ApprovalContext) -> Result<WorkflowState, WorkflowError> {
        self.check_capacity(&self.workflows.read())?;

        let matches = self.rules.evaluate(&context)?;
        if matches.is_empty() {
            warn!(
                sender = %format_address(&context.sender),
                chain_id = context.chain_id,
                "No rule matches approval context"
            );
            return Err(WorkflowError::NoMatchingRule);
        }

        let now = self.clock.now();
        let expires_at = now.saturating_add(self.config.expiration_ms());
        let workflow = WorkflowState::new(context, matches, now, Some(expires_at));

        let mut workflows = self.workflows.write();
        self.check_capacity(&workflows)?;
        workflows.insert(workflow.id, workflow.clone());
        WORKFLOWS_CREATED.inc();
        PENDING_WORKFLOWS.inc();

        info!(
            workflow_id = %workflow.id,
            chain_id = workflow.context.chain_id,
            rules = workflow.matched_rules.len(),
            expires_at,
            "Workflow created"
        );
        Ok(workflow)
    }

    fn submit_approval(
        &self,
        workflow_id: Uuid,
        approver: Address,
        signature: ApprovalSignature,
        metadata: Option<BTreeMap<String, Value>>,
    ) -> Result<WorkflowState, WorkflowError> {
        self.submit(workflow_id, approver, SignaturePath::Direct, signature, metadata)
    }

    fn submit_cross_chain_approval(
        &self,
        workflow_id: Uuid,
        approver: Address,
        source_chain_id: ChainId,
        signature: ApprovalSignature,
        metadata: Option<BTreeMap<String, Value>>,
    ) -> Result<WorkflowState, WorkflowError> {
        self.submit(
            workflow_id,
            approver,
            SignaturePath::CrossChain { source_chain_id },
            signature,
            metadata,
        )
    }

    fn reject_workflow(
        &self,
        workflow_id: Uuid,
        approver: Address,
        reason: Option<String>,
    ) -> Result<WorkflowState, WorkflowError> {
        let now = self.clock.now();
        let mut workflows = self.workflows.write();
        let workflow = workflows
            .get_mut(&workflow_id)
            .ok_or(WorkflowError::NotFound(workflow_id))?;
        Self::ensure_open(workflow, now)?;

        if !workflow.is_authorized(&approver) {
            warn!(
                workflow_id = %workflow_id,
                approver = %format_address(&approver),
                "Rejection from unauthorized approver"
            );
            return Err(WorkflowError::UnauthorizedApprover {
                id: workflow_id,
                approver: format_address(&approver),
            });
        }

        workflow
            .metadata
            .insert("rejected_by".to_string(), json!(format_address(&approver)));
        if let Some(reason) = reason {
            workflow
                .metadata
                .insert("rejection_reason".to_string(), json!(reason));
        }
        Self::finish(workflow, WorkflowStatus::Rejected, now);
        Ok(workflow.clone())
    }

    fn get_workflow(&self, workflow_id: Uuid) -> Option<WorkflowState> {
        debug!(workflow_id = %workflow_id, "Workflow lookup");
        self.workflows.read().get(&workflow_id).cloned()
    }

    /// Pending and not yet past expiry, oldest first.
    fn get_pending_workflows(&self) -> Vec<WorkflowState> {
        let now = self.clock.now();
        self.snapshot(|w| w.is_pending() && !w.is_past_expiry(now))
    }

    fn get_approver_pending_workflows(&self, approver: &Address) -> Vec<WorkflowState> {
        let now = self.clock.now();
        self.snapshot(|w| {
            w.is_pending()
                && !w.is_past_expiry(now)
                && w.is_authorized(approver)
                && !w.has_approved(approver)
        })
    }

    fn get_all_workflows(&self) -> Vec<WorkflowState> {
        self.snapshot(|_| true)
    }

    fn stats(&self) -> WorkflowStats {
        let mut stats = WorkflowStats::default();
        for workflow in self.workflows.read().values() {
            stats.count(workflow.status);
        }
        stats
    }

    fn approval_progress(&self, workflow_id: Uuid) -> Result<Vec<RuleProgress>, WorkflowError> {
        self.workflows
            .read()
            .get(&workflow_id)
            .map(WorkflowState::progress)
            .ok_or(WorkflowError::NotFound(workflow_id))
    }

    fn approval_message(
        &self,
        workflow_id: Uuid,
        approver: &Address,
        signed_at: Timestamp,
    ) -> Result<Vec<u8>, WorkflowError> {
        let workflows = self.workflows.read();
        let workflow = workflows
            .get(&workflow_id)
            .ok_or(WorkflowError::NotFound(workflow_id))?;
        Ok(approval_message(
            &workflow_id,
            approver,
            workflow.context.chain_id,
            &workflow.context.digest(),
            signed_at,
        ))
    }

    fn cleanup_expired_workflows(&self) -> CleanupReport {
        let now = self.clock.now();
        let retention = self.config.retention_ms();
        let mut report = CleanupReport::default();

        let mut workflows = self.workflows.write();
        for workflow in workflows.values_mut() {
            if workflow.is_pending()
                && workflow.is_past_expiry(now)
                && Self::finish(workflow, WorkflowStatus::Expired, now)
            {
                report.expired += 1;
            }
        }

        let before = workflows.len();
        workflows.retain(|_, w| {
            !(w.status.is_terminal() && now.saturating_sub(w.updated_at) > retention)
        });
        report.removed = before - workflows.len();
        WORKFLOWS_PURGED.inc_by(report.removed as f64);

        if report.expired > 0 || report.removed > 0 {
            info!(
                expired = report.expired,
                removed = report.removed,
                remaining = workflows.len(),
                "Workflow cleanup complete"
            );
        }
        report
    }
}
