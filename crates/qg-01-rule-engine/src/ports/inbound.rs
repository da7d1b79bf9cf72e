//! # Inbound Ports (Driving Ports / API)
//!
//! The public API of the rule engine. Implementations must be thread-safe.

use crate::domain::commitment::RuleProof;
use crate::domain::entities::{Rule, RuleDefinition, RuleMatch, RuleUpdate};
use crate::domain::errors::RuleError;
use shared_types::{ApprovalContext, Hash};

/// Rule store and evaluator.
pub trait RuleEngineApi: Send + Sync {
    // =========================================================================
    // Mutations (each one re-commits the rule set)
    // =========================================================================

    /// Validate and insert a new rule.
    fn add_rule(&self, definition: RuleDefinition) -> Result<Rule, RuleError>;

    /// Merge `update` into an existing rule and re-validate.
    fn update_rule(&self, id: &str, update: RuleUpdate) -> Result<Rule, RuleError>;

    /// Remove a rule, returning it.
    fn delete_rule(&self, id: &str) -> Result<Rule, RuleError>;

    // =========================================================================
    // Evaluation
    // =========================================================================

    /// Every rule whose conditions all match, best first.
    fn evaluate_context(&self, context: &ApprovalContext) -> Vec<RuleMatch>;

    // =========================================================================
    // Integrity
    // =========================================================================

    /// `true` iff the current rules hash to the last committed root.
    fn verify_integrity(&self) -> bool;

    /// The last committed root.
    fn commitment(&self) -> Hash;

    /// Inclusion proof for one committed rule.
    fn prove_rule(&self, id: &str) -> Result<RuleProof, RuleError>;

    // =========================================================================
    // Reads
    // =========================================================================

    fn get_rule(&self, id: &str) -> Option<Rule>;

    /// All rules, ordered by id.
    fn get_all_rules(&self) -> Vec<Rule>;
}
