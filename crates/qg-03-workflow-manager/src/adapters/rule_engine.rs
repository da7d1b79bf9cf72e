//! [`RuleEvaluator`] over the in-process [`RuleEngine`].

use crate::ports::outbound::RuleEvaluator;
use qg_01_rule_engine::{RuleEngine, RuleEngineApi, RuleError, RuleMatch};
use shared_types::ApprovalContext;
use tracing::error;

impl RuleEvaluator for RuleEngine {
    /// Refuses to evaluate against a rule set that fails its integrity check.
    fn evaluate(&self, context: &ApprovalContext) -> Result<Vec<RuleMatch>, RuleError> {
        if !self.verify_integrity() {
            error!(
                chain_id = context.chain_id,
                "Refusing evaluation: rule set integrity check failed"
            );
            return Err(RuleError::IntegrityCheckFailed);
        }
        Ok(self.evaluate_context(context))
    }
}
