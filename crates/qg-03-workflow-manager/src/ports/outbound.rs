//! # Outbound Ports (Driven Ports / SPI)
//!
//! What the workflow manager needs from the rule engine and the verifiers.
//! Adapters in `adapters/` implement these over the real components; tests
//! substitute fakes.

use qg_01_rule_engine::{RuleError, RuleMatch};
use qg_02_signature_verification::{ApprovalSignature, SignatureError};
use shared_types::{Address, ApprovalContext, ChainId};

/// Rule evaluation.
pub trait RuleEvaluator: Send + Sync {
    /// Matching rules, best first. Fails if the rule set cannot be trusted.
    fn evaluate(&self, context: &ApprovalContext) -> Result<Vec<RuleMatch>, RuleError>;
}

/// How an approval was signed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignaturePath {
    /// Signed for the workflow's own chain.
    Direct,
    /// Signed on `source_chain_id` for the workflow's chain.
    CrossChain { source_chain_id: ChainId },
}

impl SignaturePath {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::CrossChain { .. } => "cross_chain",
        }
    }

    pub fn source_chain_id(&self) -> Option<ChainId> {
        match self {
            Self::Direct => None,
            Self::CrossChain { source_chain_id } => Some(*source_chain_id),
        }
    }
}

/// Approval signature verification.
pub trait ApprovalVerifier: Send + Sync {
    /// Check that `approver` signed `message` for `destination_chain_id`.
    fn verify_approval(
        &self,
        destination_chain_id: ChainId,
        path: SignaturePath,
        message: &[u8],
        approver: &Address,
        signature: &ApprovalSignature,
    ) -> Result<(), SignatureError>;
}
