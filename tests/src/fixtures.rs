//! Shared fixtures: approvers holding real secp256k1 keys, and builders
//! for rules and contexts.

use k256::ecdsa::SigningKey;
use qg_01_rule_engine::{ConditionSpec, RuleDefinition};
use qg_02_signature_verification::{
    address_from_pubkey, cross_chain_message_hash, personal_message_hash, ApprovalSignature,
    EcdsaSignature,
};
use serde_json::json;
use shared_types::{format_address, Address, ApprovalContext, ChainId, Hash, Timestamp, U256};
use std::collections::BTreeMap;

/// Fixed start of the manual clock in every flow.
pub const T0: Timestamp = 1_700_000_000_000;
pub const MINUTE_MS: u64 = 60_000;

/// Someone who can sign approvals.
pub struct Approver {
    key: SigningKey,
    pub address: Address,
}

impl Approver {
    pub fn random() -> Self {
        let key = SigningKey::random(&mut rand::thread_rng());
        let address = address_from_pubkey(key.verifying_key());
        Self { key, address }
    }

    pub fn hex(&self) -> String {
        format_address(&self.address)
    }

    /// Sign a prehashed digest as `r || s || v` with `v` in {27, 28}.
    pub fn sign_hash(&self, hash: &Hash, signed_at: Timestamp) -> ApprovalSignature {
        let (sig, recid) = self
            .key
            .sign_prehash_recoverable(hash)
            .expect("signing failed");
        let mut raw = [0u8; 65];
        raw[..64].copy_from_slice(&sig.to_bytes());
        raw[64] = recid.to_byte() + 27;
        let signature = EcdsaSignature::from_bytes(&raw).expect("65 bytes");
        ApprovalSignature::new(signature, signed_at)
    }

    /// Personal-message signature over `message`.
    pub fn sign(&self, message: &[u8], signed_at: Timestamp) -> ApprovalSignature {
        self.sign_hash(&personal_message_hash(message), signed_at)
    }

    /// Signature over `message` framed for the `(source, destination)` pair.
    pub fn sign_cross_chain(
        &self,
        source: ChainId,
        destination: ChainId,
        message: &[u8],
        signed_at: Timestamp,
    ) -> ApprovalSignature {
        self.sign_hash(
            &cross_chain_message_hash(source, destination, message),
            signed_at,
        )
    }
}

/// `required`-of-`approvers` rule matching amounts above `threshold`.
pub fn transfer_rule(
    id: &str,
    threshold: u64,
    required: u32,
    approvers: &[&Approver],
) -> RuleDefinition {
    RuleDefinition {
        id: id.to_string(),
        name: format!("transfers above {threshold}"),
        conditions: vec![ConditionSpec::new("amount", "gt", json!(threshold))],
        required_approvals: Some(required),
        approvers: approvers.iter().map(|a| a.hex()).collect(),
        timeout_minutes: Some(30),
        priority: 0,
        tags: vec!["treasury".to_string()],
        metadata: BTreeMap::new(),
    }
}

/// Transfer of `amount` on `chain_id` from a fixed treasury sender.
pub fn transfer(chain_id: ChainId, amount: u64) -> ApprovalContext {
    ApprovalContext::new([0x7E; 20], chain_id, T0)
        .with_recipient([0x5A; 20])
        .with_amount(U256::from(amount))
}
