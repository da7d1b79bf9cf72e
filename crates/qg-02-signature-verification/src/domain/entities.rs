//! # Domain Entities
//!
//! Signatures, signed transactions, verifier configuration and results.

use super::errors::SignatureError;
use serde::{Deserialize, Serialize};
use shared_types::{keccak256, Address, ApprovalConfig, ChainId, Hash, Timestamp, U256};
use std::collections::BTreeSet;
use std::time::Duration;

/// Length of an encoded `r || s || v` signature.
pub const SIGNATURE_LENGTH: usize = 65;

// =============================================================================
// ECDSA Types (secp256k1)
// =============================================================================

/// ECDSA signature on the secp256k1 curve.
///
/// Serialized as a `0x`-prefixed hex string of `r || s || v`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EcdsaSignature {
    /// R component (32 bytes)
    pub r: [u8; 32],
    /// S component (32 bytes)
    pub s: [u8; 32],
    /// Recovery ID (0, 1, 27, or 28)
    pub v: u8,
}

impl EcdsaSignature {
    /// Decode 65 bytes `r || s || v`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(SignatureError::InvalidLength(bytes.len()));
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { r, s, v: bytes[64] })
    }

    /// Decode hex, with or without `0x`.
    pub fn from_hex(input: &str) -> Result<Self, SignatureError> {
        let digits = input.trim().trim_start_matches("0x");
        let bytes = hex::decode(digits).map_err(|_| SignatureError::InvalidHex)?;
        Self::from_bytes(&bytes)
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut out = [0u8; SIGNATURE_LENGTH];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }
}

impl TryFrom<String> for EcdsaSignature {
    type Error = SignatureError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<EcdsaSignature> for String {
    fn from(signature: EcdsaSignature) -> Self {
        signature.to_hex()
    }
}

/// An approver's signature plus the moment it was produced.
///
/// The timestamp is also part of the signed approval message, so it cannot
/// be moved forward without invalidating the signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalSignature {
    pub signature: EcdsaSignature,
    pub timestamp: Timestamp,
}

impl ApprovalSignature {
    pub fn new(signature: EcdsaSignature, timestamp: Timestamp) -> Self {
        Self {
            signature,
            timestamp,
        }
    }
}

// =============================================================================
// Transactions
// =============================================================================

/// A chain-bound signed transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub chain_id: ChainId,
    pub nonce: u64,
    #[serde(default, with = "shared_types::option_address_hex")]
    pub to: Option<Address>,
    pub value: U256,
    #[serde(default)]
    pub data: Vec<u8>,
    pub signature: EcdsaSignature,
}

impl SignedTransaction {
    /// Hash the signer committed to.
    ///
    /// `chain_id || nonce || has_to || to? || value || data`, so the same
    /// signature is never valid on another chain.
    pub fn signing_hash(&self) -> Hash {
        let mut buf = Vec::with_capacity(8 + 8 + 1 + 20 + 32 + self.data.len());
        buf.extend_from_slice(&self.chain_id.to_be_bytes());
        buf.extend_from_slice(&self.nonce.to_be_bytes());
        match &self.to {
            Some(to) => {
                buf.push(1);
                buf.extend_from_slice(to);
            }
            None => buf.push(0),
        }
        let mut value = [0u8; 32];
        self.value.to_big_endian(&mut value);
        buf.extend_from_slice(&value);
        buf.extend_from_slice(&self.data);
        keccak256(&buf)
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Default tolerance for signature timestamps ahead of the local clock.
pub const DEFAULT_MAX_CLOCK_SKEW: Duration = Duration::from_secs(300);

/// Per-chain verifier configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifierConfig {
    /// Chain this verifier is bound to (the destination for cross-chain).
    pub chain_id: ChainId,
    /// Chains accepted for transactions and as cross-chain sources.
    pub supported_chains: BTreeSet<ChainId>,
    pub max_signature_age: Duration,
    pub max_clock_skew: Duration,
    pub verification_timeout: Duration,
}

impl VerifierConfig {
    /// Same settings, bound to another chain. That chain becomes supported.
    pub fn with_chain_id(&self, chain_id: ChainId) -> Self {
        let mut config = self.clone();
        config.chain_id = chain_id;
        config.supported_chains.insert(chain_id);
        config
    }

    pub fn is_supported(&self, chain_id: ChainId) -> bool {
        self.supported_chains.contains(&chain_id)
    }
}

impl From<&ApprovalConfig> for VerifierConfig {
    fn from(config: &ApprovalConfig) -> Self {
        Self {
            chain_id: config.chain_id,
            supported_chains: config.supported_chains.clone(),
            max_signature_age: config.max_signature_age,
            max_clock_skew: DEFAULT_MAX_CLOCK_SKEW,
            verification_timeout: config.verification_timeout,
        }
    }
}

// =============================================================================
// Verification Result
// =============================================================================

/// Context recorded with every verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationMetadata {
    /// Chain of the verifier that ran the check.
    pub chain_id: ChainId,
    /// Set on the cross-chain path.
    pub source_chain_id: Option<ChainId>,
    /// Digest the signature was checked against.
    pub message_hash: Hash,
    pub verified_at: Timestamp,
}

/// Result of signature verification.
#[derive(Clone, Debug)]
pub struct VerificationResult {
    pub is_valid: bool,
    /// Recovered signer, set only when valid.
    pub signer: Option<Address>,
    /// Error details (if verification failed)
    pub error: Option<SignatureError>,
    pub metadata: VerificationMetadata,
}

impl VerificationResult {
    pub fn valid(signer: Address, metadata: VerificationMetadata) -> Self {
        Self {
            is_valid: true,
            signer: Some(signer),
            error: None,
            metadata,
        }
    }

    pub fn invalid(error: SignatureError, metadata: VerificationMetadata) -> Self {
        Self {
            is_valid: false,
            signer: None,
            error: Some(error),
            metadata,
        }
    }

    /// Collapse into a `Result`.
    pub fn into_result(self) -> Result<Address, SignatureError> {
        match (self.is_valid, self.signer, self.error) {
            (true, Some(signer), _) => Ok(signer),
            (_, _, Some(error)) => Err(error),
            _ => Err(SignatureError::RecoveryFailed),
        }
    }
}
