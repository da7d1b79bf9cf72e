//! # Rule Engine Service
//!
//! Implements [`RuleEngineApi`] over an in-memory rule store.
//!
//! The rules and their committed Merkle root live behind one
//! `parking_lot::RwLock`, so a mutation and its re-commit are observed
//! together. Every mutation builds the candidate rule first and touches
//! the store only once it is valid.

use crate::domain::commitment::{RuleCommitment, RuleProof};
use crate::domain::entities::{Rule, RuleDefaults, RuleDefinition, RuleMatch, RuleUpdate};
use crate::domain::errors::RuleError;
use crate::ports::inbound::RuleEngineApi;
use parking_lot::RwLock;
use shared_types::{ApprovalConfig, ApprovalContext, Hash, SystemTimeSource, TimeSource};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

struct RuleStore {
    rules: BTreeMap<String, Rule>,
    committed_root: Hash,
}

impl RuleStore {
    fn recommit(&mut self) {
        self.committed_root = RuleCommitment::build(self.rules.values()).root();
    }
}

/// Policy store and evaluator.
pub struct RuleEngine {
    store: RwLock<RuleStore>,
    defaults: RuleDefaults,
    clock: Arc<dyn TimeSource>,
}

impl RuleEngine {
    pub fn new(defaults: RuleDefaults, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            store: RwLock::new(RuleStore {
                rules: BTreeMap::new(),
                committed_root: RuleCommitment::build(std::iter::empty()).root(),
            }),
            defaults,
            clock,
        }
    }

    /// Engine using the config's defaults and the system clock.
    pub fn from_config(config: &ApprovalConfig) -> Self {
        Self::new(RuleDefaults::from(config), Arc::new(SystemTimeSource))
    }

    pub fn defaults(&self) -> RuleDefaults {
        self.defaults
    }

    pub fn rule_count(&self) -> usize {
        self.store.read().rules.len()
    }
}

impl RuleEngineApi for RuleEngine {
    fn add_rule(&self, definition: RuleDefinition) -> Result<Rule, RuleError> {
        let rule = Rule::from_definition(definition, &self.defaults)?;

        let mut store = self.store.write();
        if store.rules.contains_key(&rule.id) {
            return Err(RuleError::DuplicateRule(rule.id));
        }
        store.rules.insert(rule.id.clone(), rule.clone());
        store.recommit();

        info!(
            rule_id = %rule.id,
            priority = rule.priority,
            required_approvals = rule.required_approvals,
            approvers = rule.approvers.len(),
            "Rule added"
        );
        Ok(rule)
    }

    fn update_rule(&self, id: &str, update: RuleUpdate) -> Result<Rule, RuleError> {
        let mut store = self.store.write();
        let current = store
            .rules
            .get(id)
            .ok_or_else(|| RuleError::RuleNotFound(id.to_string()))?;
        let updated = current.apply_update(update)?;

        store.rules.insert(id.to_string(), updated.clone());
        store.recommit();

        info!(rule_id = %id, "Rule updated");
        Ok(updated)
    }

    fn delete_rule(&self, id: &str) -> Result<Rule, RuleError> {
        let mut store = self.store.write();
        let removed = store
            .rules
            .remove(id)
            .ok_or_else(|| RuleError::RuleNotFound(id.to_string()))?;
        store.recommit();

        info!(rule_id = %id, "Rule deleted");
        Ok(removed)
    }

    fn evaluate_context(&self, context: &ApprovalContext) -> Vec<RuleMatch> {
        let now = self.clock.now();
        let store = self.store.read();

        let mut matches: Vec<RuleMatch> = store
            .rules
            .values()
            .filter(|rule| rule.conditions.iter().all(|c| c.evaluate(context)))
            .map(|rule| RuleMatch::new(rule.clone(), rule.conditions.clone(), now))
            .collect();
        drop(store);

        matches.sort_by(|a, b| {
            b.rule
                .priority
                .cmp(&a.rule.priority)
                .then_with(|| b.score.cmp(&a.score))
                .then_with(|| a.rule.id.cmp(&b.rule.id))
        });

        debug!(
            chain_id = context.chain_id,
            matched = matches.len(),
            "Context evaluated"
        );
        matches
    }

    fn verify_integrity(&self) -> bool {
        let store = self.store.read();
        let current = RuleCommitment::build(store.rules.values()).root();
        let intact = current == store.committed_root;
        if !intact {
            warn!(
                committed = %hex::encode(store.committed_root),
                current = %hex::encode(current),
                "Rule set does not match its committed root"
            );
        }
        intact
    }

    fn commitment(&self) -> Hash {
        self.store.read().committed_root
    }

    fn prove_rule(&self, id: &str) -> Result<RuleProof, RuleError> {
        let store = self.store.read();
        let rule = store
            .rules
            .get(id)
            .ok_or_else(|| RuleError::RuleNotFound(id.to_string()))?;
        RuleCommitment::build(store.rules.values())
            .prove(rule)
            .ok_or_else(|| RuleError::RuleNotFound(id.to_string()))
    }

    fn get_rule(&self, id: &str) -> Option<Rule> {
        self.store.read().rules.get(id).cloned()
    }

    fn get_all_rules(&self) -> Vec<Rule> {
        self.store.read().rules.values().cloned().collect()
    }
}
