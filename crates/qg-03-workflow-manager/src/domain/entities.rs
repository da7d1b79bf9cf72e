//! # Domain Entities
//!
//! Workflow state machine, approvals and read models.

use qg_01_rule_engine::RuleMatch;
use qg_02_signature_verification::ApprovalSignature;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::{address_hex, ApprovalContext, Address, ChainId, Timestamp};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Workflow lifecycle.
///
/// ```text
/// pending ──► approved
///    │──────► rejected
///    └──────► expired
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Expired,
}

impl WorkflowStatus {
    pub fn can_transition_to(&self, next: WorkflowStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved)
                | (Self::Pending, Self::Rejected)
                | (Self::Pending, Self::Expired)
        )
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One accepted approval. Append-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub id: Uuid,
    #[serde(with = "address_hex")]
    pub approver: Address,
    /// When the approval was accepted.
    pub timestamp: Timestamp,
    pub signature: ApprovalSignature,
    /// Chain the approver signed from, for cross-chain approvals.
    #[serde(default)]
    pub source_chain_id: Option<ChainId>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

/// One approval request and its progress.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub id: Uuid,
    pub status: WorkflowStatus,
    pub context: ApprovalContext,
    /// Best match first.
    pub matched_rules: Vec<RuleMatch>,
    pub approvals: Vec<Approval>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub expires_at: Option<Timestamp>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl WorkflowState {
    pub fn new(
        context: ApprovalContext,
        matched_rules: Vec<RuleMatch>,
        now: Timestamp,
        expires_at: Option<Timestamp>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: WorkflowStatus::Pending,
            context,
            matched_rules,
            approvals: Vec::new(),
            created_at: now,
            updated_at: now,
            expires_at,
            metadata: BTreeMap::new(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == WorkflowStatus::Pending
    }

    /// Past `expires_at` at `now`.
    pub fn is_past_expiry(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|at| now > at)
    }

    pub fn has_approved(&self, approver: &Address) -> bool {
        self.approvals.iter().any(|a| &a.approver == approver)
    }

    /// Listed by at least one matched rule.
    pub fn is_authorized(&self, approver: &Address) -> bool {
        self.matched_rules.iter().any(|m| m.rule.is_approver(approver))
    }

    /// Move to `next` if the state machine allows it.
    pub fn transition(&mut self, next: WorkflowStatus, now: Timestamp) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        self.updated_at = now;
        true
    }

    /// Append `approval`, count it against every rule listing the approver,
    /// and approve if any rule reached quorum. Returns the new status.
    pub fn apply_approval(&mut self, approval: Approval, now: Timestamp) -> WorkflowStatus {
        for rule_match in &mut self.matched_rules {
            rule_match.record_approval(&approval.approver);
        }
        self.approvals.push(approval);
        self.updated_at = now;

        if self.matched_rules.iter().any(RuleMatch::is_satisfied) {
            self.transition(WorkflowStatus::Approved, now);
        }
        self.status
    }

    pub fn progress(&self) -> Vec<RuleProgress> {
        self.matched_rules
            .iter()
            .map(|m| RuleProgress {
                rule_id: m.rule.id.clone(),
                required_approvals: m.required_approvals,
                remaining_approvals: m.remaining_approvals,
                deadline: m.deadline,
            })
            .collect()
    }
}

/// Quorum progress of one matched rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleProgress {
    pub rule_id: String,
    pub required_approvals: u32,
    pub remaining_approvals: u32,
    pub deadline: Timestamp,
}

/// Workflow counts by status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStats {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub expired: usize,
}

impl WorkflowStats {
    pub fn total(&self) -> usize {
        self.pending + self.approved + self.rejected + self.expired
    }

    pub(crate) fn count(&mut self, status: WorkflowStatus) {
        match status {
            WorkflowStatus::Pending => self.pending += 1,
            WorkflowStatus::Approved => self.approved += 1,
            WorkflowStatus::Rejected => self.rejected += 1,
            WorkflowStatus::Expired => self.expired += 1,
        }
    }
}

/// Outcome of one expiry sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Pending workflows moved to expired.
    pub expired: usize,
    /// Terminal workflows deleted after retention.
    pub removed: usize,
}
