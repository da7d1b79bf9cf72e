//! # Rule Engine (QG-01)
//!
//! Owns the approval policy set. Evaluates an [`ApprovalContext`] against
//! every rule and keeps a Merkle commitment of the set so out-of-band
//! tampering with the store is detectable.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): conditions, rules, commitment
//! - **Ports Layer** (`ports/`): [`RuleEngineApi`]
//! - **Service Layer** (`service.rs`): [`RuleEngine`], the locked store
//!
//! ## Example
//!
//! ```ignore
//! use qg_01_rule_engine::{RuleEngine, RuleEngineApi};
//!
//! let engine = RuleEngine::from_config(&config);
//! engine.add_rule(serde_json::from_str(policy_json)?)?;
//! let matches = engine.evaluate_context(&context);
//! assert!(engine.verify_integrity());
//! ```
//!
//! [`ApprovalContext`]: shared_types::ApprovalContext

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::commitment::{leaf_hash, RuleCommitment, RuleProof, EMPTY_ROOT};
pub use domain::conditions::{
    AddressPredicate, Condition, ConditionSpec, ConditionType, NumericPredicate, Operator,
    Pattern, ValuePredicate,
};
pub use domain::entities::{Rule, RuleDefaults, RuleDefinition, RuleMatch, RuleUpdate};
pub use domain::errors::{ConditionError, RuleError};
pub use ports::inbound::RuleEngineApi;
pub use service::RuleEngine;
