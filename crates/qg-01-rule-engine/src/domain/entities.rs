//! # Domain Entities
//!
//! Rules, their authoring form, partial updates and evaluation matches.

use super::conditions::{Condition, ConditionSpec};
use super::errors::RuleError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::{address_list_hex, parse_address, Address, ApprovalConfig, Timestamp};
use std::collections::{BTreeMap, HashSet};

/// Defaults applied to rule definitions that omit optional fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuleDefaults {
    pub required_approvals: u32,
    pub timeout_minutes: u64,
}

impl Default for RuleDefaults {
    fn default() -> Self {
        Self {
            required_approvals: 2,
            timeout_minutes: 60,
        }
    }
}

impl From<&ApprovalConfig> for RuleDefaults {
    fn from(config: &ApprovalConfig) -> Self {
        Self {
            required_approvals: config.default_required_approvals,
            timeout_minutes: config.default_timeout_minutes,
        }
    }
}

/// A rule as authored (policy file, admin API).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub id: String,
    pub name: String,
    pub conditions: Vec<ConditionSpec>,
    #[serde(default)]
    pub required_approvals: Option<u32>,
    pub approvers: Vec<String>,
    #[serde(default)]
    pub timeout_minutes: Option<u64>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

/// A validated approval policy.
///
/// ## Invariants
///
/// - `id` and `name` are non-empty
/// - at least one condition and one approver, approvers distinct
/// - `1 <= required_approvals <= approvers.len()`
/// - `timeout_minutes >= 1`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub conditions: Vec<Condition>,
    pub required_approvals: u32,
    #[serde(with = "address_list_hex")]
    pub approvers: Vec<Address>,
    pub timeout_minutes: u64,
    pub priority: i32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl Rule {
    /// Compile and validate an authored rule.
    pub fn from_definition(
        definition: RuleDefinition,
        defaults: &RuleDefaults,
    ) -> Result<Self, RuleError> {
        let id = definition.id;
        let rule = Self {
            conditions: compile_conditions(&id, &definition.conditions)?,
            approvers: parse_approvers(&id, &definition.approvers)?,
            required_approvals: definition
                .required_approvals
                .unwrap_or(defaults.required_approvals),
            timeout_minutes: definition.timeout_minutes.unwrap_or(defaults.timeout_minutes),
            name: definition.name,
            priority: definition.priority,
            tags: definition.tags,
            metadata: definition.metadata,
            id,
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Check every structural invariant.
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.id.trim().is_empty() {
            return Err(RuleError::invalid(&self.id, "missing id"));
        }
        if self.name.trim().is_empty() {
            return Err(RuleError::invalid(&self.id, "missing name"));
        }
        if self.conditions.is_empty() {
            return Err(RuleError::invalid(&self.id, "at least one condition is required"));
        }
        if self.approvers.is_empty() {
            return Err(RuleError::invalid(&self.id, "at least one approver is required"));
        }
        let distinct: HashSet<&Address> = self.approvers.iter().collect();
        if distinct.len() != self.approvers.len() {
            return Err(RuleError::invalid(&self.id, "approvers must be distinct"));
        }
        if self.required_approvals == 0 {
            return Err(RuleError::invalid(&self.id, "required_approvals must be at least 1"));
        }
        if self.required_approvals as usize > self.approvers.len() {
            return Err(RuleError::invalid(
                &self.id,
                format!(
                    "required_approvals {} exceeds {} approvers",
                    self.required_approvals,
                    self.approvers.len()
                ),
            ));
        }
        if self.timeout_minutes == 0 {
            return Err(RuleError::invalid(&self.id, "timeout_minutes must be at least 1"));
        }
        Ok(())
    }

    /// Produce the updated rule. `self` is left untouched.
    pub fn apply_update(&self, update: RuleUpdate) -> Result<Self, RuleError> {
        let mut next = self.clone();
        if let Some(name) = update.name {
            next.name = name;
        }
        if let Some(conditions) = update.conditions {
            next.conditions = compile_conditions(&self.id, &conditions)?;
        }
        if let Some(required) = update.required_approvals {
            next.required_approvals = required;
        }
        if let Some(approvers) = update.approvers {
            next.approvers = parse_approvers(&self.id, &approvers)?;
        }
        if let Some(timeout) = update.timeout_minutes {
            next.timeout_minutes = timeout;
        }
        if let Some(priority) = update.priority {
            next.priority = priority;
        }
        if let Some(tags) = update.tags {
            next.tags = tags;
        }
        if let Some(metadata) = update.metadata {
            next.metadata = metadata;
        }
        next.validate()?;
        Ok(next)
    }

    pub fn is_approver(&self, address: &Address) -> bool {
        self.approvers.contains(address)
    }

    /// Timeout in milliseconds.
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_minutes.saturating_mul(60_000)
    }
}

fn compile_conditions(rule_id: &str, specs: &[ConditionSpec]) -> Result<Vec<Condition>, RuleError> {
    specs
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            Condition::from_spec(spec)
                .map_err(|e| RuleError::invalid(rule_id, format!("condition {i}: {e}")))
        })
        .collect()
}

fn parse_approvers(rule_id: &str, approvers: &[String]) -> Result<Vec<Address>, RuleError> {
    approvers
        .iter()
        .map(|a| {
            parse_address(a).map_err(|e| RuleError::invalid(rule_id, format!("approver: {e}")))
        })
        .collect()
}

/// Partial update. `None` keeps the current value; the id cannot change.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub conditions: Option<Vec<ConditionSpec>>,
    #[serde(default)]
    pub required_approvals: Option<u32>,
    #[serde(default)]
    pub approvers: Option<Vec<String>>,
    #[serde(default)]
    pub timeout_minutes: Option<u64>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, Value>>,
}

/// One rule whose entire condition set matched a context.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleMatch {
    pub rule: Rule,
    pub matched_conditions: Vec<Condition>,
    /// Number of matched conditions.
    pub score: usize,
    pub required_approvals: u32,
    /// Counts down as authorized approvals arrive.
    pub remaining_approvals: u32,
    pub deadline: Timestamp,
}

impl RuleMatch {
    pub fn new(rule: Rule, matched_conditions: Vec<Condition>, now: Timestamp) -> Self {
        Self {
            score: matched_conditions.len(),
            required_approvals: rule.required_approvals,
            remaining_approvals: rule.required_approvals,
            deadline: now.saturating_add(rule.timeout_ms()),
            matched_conditions,
            rule,
        }
    }

    /// Quorum reached.
    pub fn is_satisfied(&self) -> bool {
        self.remaining_approvals == 0
    }

    /// Count an approval if `approver` belongs to this rule.
    pub fn record_approval(&mut self, approver: &Address) -> bool {
        if !self.rule.is_approver(approver) {
            return false;
        }
        self.remaining_approvals = self.remaining_approvals.saturating_sub(1);
        true
    }
}
