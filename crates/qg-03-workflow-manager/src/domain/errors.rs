//! # Workflow Errors
//!
//! Every failure is returned to the caller; nothing is retried.
//! `InvalidSignature` carries no detail; the specific verification
//! failure is only logged.

use super::entities::WorkflowStatus;
use qg_01_rule_engine::RuleError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    /// Too many pending workflows. Retry later.
    #[error("Capacity exceeded: {pending} pending workflows (max {max})")]
    Capacity { pending: usize, max: usize },

    /// The context matched no rule.
    #[error("No rule matches the approval context")]
    NoMatchingRule,

    #[error("Workflow not found: {0}")]
    NotFound(Uuid),

    /// The workflow is no longer pending.
    #[error("Workflow {id} is {status}, not pending")]
    InvalidState { id: Uuid, status: WorkflowStatus },

    /// The workflow passed its expiration and is now expired.
    #[error("Workflow {0} has expired")]
    Expired(Uuid),

    #[error("Signature verification failed")]
    InvalidSignature,

    #[error("Approver {approver} already approved workflow {id}")]
    DuplicateApproval { id: Uuid, approver: String },

    #[error("Approver {approver} is not authorized for workflow {id}")]
    UnauthorizedApprover { id: Uuid, approver: String },

    /// Rule engine failure, including a failed integrity check.
    #[error(transparent)]
    Rules(#[from] RuleError),
}

impl WorkflowError {
    /// Short stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Capacity { .. } => "capacity",
            Self::NoMatchingRule => "no_matching_rule",
            Self::NotFound(_) => "not_found",
            Self::InvalidState { .. } => "invalid_state",
            Self::Expired(_) => "expired",
            Self::InvalidSignature => "invalid_signature",
            Self::DuplicateApproval { .. } => "duplicate",
            Self::UnauthorizedApprover { .. } => "unauthorized",
            Self::Rules(_) => "rules",
        }
    }
}
