//! # Rule-Set Commitment
//!
//! Keccak-256 Merkle tree over the stored rules. The root changes whenever
//! any stored rule changes; `verify_integrity` compares a fresh root with
//! the one recorded at the last authorized mutation.
//!
//! ## Construction
//!
//! - Leaf = keccak256(canonical JSON of the rule's policy fields)
//! - Leaves are sorted, so insertion order does not affect the root
//! - Parent = keccak256(min(a, b) || max(a, b))
//! - An unpaired node is promoted to the next level unchanged
//! - The empty set commits to the zero hash

use super::entities::Rule;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_types::{format_address, keccak256, Hash};

/// Root of the empty rule set.
pub const EMPTY_ROOT: Hash = [0u8; 32];

/// Canonical leaf hash for one rule.
///
/// Covers id, name, conditions, quorum, approvers (sorted), timeout and
/// priority. Tags and metadata are descriptive and not committed.
pub fn leaf_hash(rule: &Rule) -> Hash {
    let mut approvers: Vec<String> = rule.approvers.iter().map(format_address).collect();
    approvers.sort();
    let conditions: Vec<_> = rule.conditions.iter().map(|c| c.to_spec()).collect();

    let canonical = json!({
        "id": rule.id,
        "name": rule.name,
        "conditions": conditions,
        "required_approvals": rule.required_approvals,
        "approvers": approvers,
        "timeout_minutes": rule.timeout_minutes,
        "priority": rule.priority,
    });
    keccak256(canonical.to_string().as_bytes())
}

/// Merkle commitment over a rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleCommitment {
    /// Level 0 holds the sorted leaves, the last level holds the root.
    levels: Vec<Vec<Hash>>,
}

impl RuleCommitment {
    /// Build the commitment for any collection of rules.
    pub fn build<'a>(rules: impl IntoIterator<Item = &'a Rule>) -> Self {
        let mut leaves: Vec<Hash> = rules.into_iter().map(leaf_hash).collect();
        leaves.sort_unstable();

        let mut levels = vec![leaves];
        while let Some(current) = levels.last() {
            if current.len() <= 1 {
                break;
            }
            let next = current
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => hash_pair(left, right),
                    [single] => *single,
                    _ => EMPTY_ROOT,
                })
                .collect();
            levels.push(next);
        }
        Self { levels }
    }

    pub fn root(&self) -> Hash {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or(EMPTY_ROOT)
    }

    pub fn leaf_count(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    /// Inclusion proof for `rule`, or `None` if it is not committed.
    pub fn prove(&self, rule: &Rule) -> Option<RuleProof> {
        let leaf = leaf_hash(rule);
        let mut index = self.levels.first()?.binary_search(&leaf).ok()?;

        let mut path = Vec::new();
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = index ^ 1;
            if let Some(hash) = level.get(sibling) {
                path.push(*hash);
            }
            index /= 2;
        }

        Some(RuleProof {
            rule_id: rule.id.clone(),
            leaf,
            path,
            root: self.root(),
        })
    }

    /// Recompute the root from a leaf and its sibling path.
    pub fn verify_proof(leaf: &Hash, path: &[Hash], expected_root: &Hash) -> bool {
        let computed = path
            .iter()
            .fold(*leaf, |current, sibling| hash_pair(&current, sibling));
        computed == *expected_root
    }
}

/// Proof that a rule is part of a committed rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleProof {
    pub rule_id: String,
    pub leaf: Hash,
    /// Sibling hashes from leaf to root. Promoted levels contribute nothing.
    pub path: Vec<Hash>,
    pub root: Hash,
}

impl RuleProof {
    /// Check the proof against its own recorded root.
    pub fn verify(&self) -> bool {
        RuleCommitment::verify_proof(&self.leaf, &self.path, &self.root)
    }
}

fn hash_pair(a: &Hash, b: &Hash) -> Hash {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(low);
    buf[32..].copy_from_slice(high);
    keccak256(&buf)
}
