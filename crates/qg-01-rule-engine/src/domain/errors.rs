//! # Rule Errors
//!
//! Policy authoring mistakes. Every failure leaves the rule store untouched.

use thiserror::Error;

/// Errors from rule-store mutations and lookups.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleError {
    /// A rule with this id already exists.
    #[error("Duplicate rule: {0}")]
    DuplicateRule(String),

    /// The rule violates a structural invariant.
    #[error("Invalid rule {rule_id}: {reason}")]
    InvalidRule { rule_id: String, reason: String },

    /// No rule with this id.
    #[error("Rule not found: {0}")]
    RuleNotFound(String),

    /// The stored rules no longer hash to the committed root.
    #[error("Rule set integrity check failed")]
    IntegrityCheckFailed,
}

impl RuleError {
    pub(crate) fn invalid(rule_id: &str, reason: impl Into<String>) -> Self {
        Self::InvalidRule {
            rule_id: rule_id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Why a single condition could not be constructed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConditionError {
    #[error("unknown condition type '{0}'")]
    UnknownType(String),

    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("operator '{operator}' is not supported for '{kind}' conditions")]
    UnsupportedOperator { kind: String, operator: String },

    #[error("condition value must not be null")]
    NullValue,

    #[error("invalid condition value: {0}")]
    InvalidValue(String),

    #[error("custom conditions need a context key")]
    MissingContextKey,

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
}
