//! # Core Domain Entities
//!
//! Primitive identifiers and the approval context evaluated by the rule
//! engine and carried by every workflow.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::collections::BTreeMap;

use crate::errors::AddressError;

// Re-export U256 from primitive-types for amounts across all components
pub use primitive_types::U256;

/// A 32-byte Keccak-256 hash.
pub type Hash = [u8; 32];

/// A 20-byte EVM address (last 20 bytes of keccak256(pubkey)).
pub type Address = [u8; 20];

/// EVM chain identifier (1 = Ethereum mainnet, 137 = Polygon, ...).
pub type ChainId = u64;

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// Keccak-256 hash function.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Parse a hex address, with or without `0x`, in any letter case.
pub fn parse_address(input: &str) -> Result<Address, AddressError> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.len() != 40 {
        return Err(AddressError::InvalidLength {
            input: input.to_string(),
            length: digits.len(),
        });
    }

    let mut address = [0u8; 20];
    hex::decode_to_slice(digits, &mut address)
        .map_err(|_| AddressError::InvalidHex(input.to_string()))?;
    Ok(address)
}

/// Lowercase `0x`-prefixed rendering of an address.
pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address))
}

/// Serde adapter rendering an [`Address`] as a lowercase hex string.
pub mod address_hex {
    use super::{format_address, parse_address, Address};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(address: &Address, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_address(address))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_address(&raw).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for `Option<Address>`.
pub mod option_address_hex {
    use super::{format_address, parse_address, Address};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        address: &Option<Address>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match address {
            Some(a) => serializer.serialize_some(&format_address(a)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Address>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| parse_address(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Serde adapter for `Vec<Address>`.
pub mod address_list_hex {
    use super::{format_address, parse_address, Address};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(addresses: &[Address], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(addresses.iter().map(format_address))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Address>, D::Error> {
        let raw: Vec<String> = Vec::deserialize(deserializer)?;
        raw.iter()
            .map(|s| parse_address(s).map_err(serde::de::Error::custom))
            .collect()
    }
}

// =============================================================================
// APPROVAL CONTEXT
// =============================================================================

/// The operation that needs approval.
///
/// Immutable input to rule evaluation. Never mutated after creation; the
/// workflow manager stores a copy inside each workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalContext {
    /// Account initiating the operation.
    #[serde(with = "address_hex")]
    pub sender: Address,
    /// Transfer recipient.
    #[serde(default, with = "option_address_hex")]
    pub recipient: Option<Address>,
    /// Transferred amount in the chain's base unit.
    #[serde(default)]
    pub amount: Option<U256>,
    /// Target contract for contract calls.
    #[serde(default, with = "option_address_hex")]
    pub contract_address: Option<Address>,
    /// 4-byte method selector as hex (e.g. `0xa9059cbb`).
    #[serde(default)]
    pub method_id: Option<String>,
    /// Decoded call parameters.
    #[serde(default)]
    pub parameters: Option<serde_json::Value>,
    /// When the operation was requested.
    pub timestamp: Timestamp,
    /// Chain the operation targets.
    pub chain_id: ChainId,
    /// Free-form attributes tested by `custom` conditions.
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl ApprovalContext {
    /// Start a context with the two mandatory attributes.
    pub fn new(sender: Address, chain_id: ChainId, timestamp: Timestamp) -> Self {
        Self {
            sender,
            recipient: None,
            amount: None,
            contract_address: None,
            method_id: None,
            parameters: None,
            timestamp,
            chain_id,
            metadata: BTreeMap::new(),
        }
    }

    /// Set the recipient.
    pub fn with_recipient(mut self, recipient: Address) -> Self {
        self.recipient = Some(recipient);
        self
    }

    /// Set the amount.
    pub fn with_amount(mut self, amount: U256) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Set the target contract and method selector.
    pub fn with_contract_call(mut self, contract: Address, method_id: impl Into<String>) -> Self {
        self.contract_address = Some(contract);
        self.method_id = Some(method_id.into());
        self
    }

    /// Set decoded call parameters.
    pub fn with_parameters(mut self, parameters: serde_json::Value) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Add one metadata attribute.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Canonical serialization (field order fixed, metadata key-sorted).
    pub fn canonical_bytes(&self) -> Vec<u8> {
        // A struct of plain data with BTreeMap keys cannot fail to serialize.
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Keccak-256 of the canonical serialization.
    ///
    /// Bound into every approval message so a signature cannot be replayed
    /// against a different operation.
    pub fn digest(&self) -> Hash {
        keccak256(&self.canonical_bytes())
    }
}
