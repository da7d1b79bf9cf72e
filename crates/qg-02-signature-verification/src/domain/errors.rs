//! # Signature Errors
//!
//! Every variant is detailed on purpose: these go to the logs. Callers
//! outside this crate are expected to collapse them into a single
//! "verification failed" before answering a client.

use shared_types::{format_address, Address, ChainId};
use thiserror::Error;

/// Errors that can occur during signature verification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// The signature format is invalid (bad scalar, not a curve point)
    #[error("Invalid signature format")]
    InvalidFormat,

    /// Encoded signature is not 65 bytes
    #[error("Invalid signature length: expected 65 bytes, got {0}")]
    InvalidLength(usize),

    /// Encoded signature is not valid hex
    #[error("Invalid signature hex encoding")]
    InvalidHex,

    /// Signature has high S value (EIP-2 malleability protection)
    #[error("Malleable signature (high S value)")]
    MalleableSignature,

    /// Invalid recovery ID (v must be 0, 1, 27, or 28)
    #[error("Invalid recovery ID: {0}")]
    InvalidRecoveryId(u8),

    /// Failed to recover public key from signature
    #[error("Failed to recover public key")]
    RecoveryFailed,

    /// Signature timestamp is older than the configured maximum age
    #[error("Signature expired: age {age_ms}ms exceeds {max_age_ms}ms")]
    ExpiredSignature { age_ms: u64, max_age_ms: u64 },

    /// Signature timestamp lies too far in the future
    #[error("Signature timestamp {ahead_ms}ms in the future")]
    FutureTimestamp { ahead_ms: u64 },

    /// Recovered signer does not match expected signer
    #[error("Signer mismatch: expected {}, got {}", format_address(.expected), format_address(.actual))]
    SignerMismatch { expected: Address, actual: Address },

    /// Chain id is not in the supported set
    #[error("Unsupported chain: {0}")]
    UnsupportedChain(ChainId),

    /// Verification exceeded its wall-clock budget
    #[error("Verification timed out after {elapsed_ms}ms (limit {limit_ms}ms)")]
    VerificationTimeout { elapsed_ms: u64, limit_ms: u64 },
}

impl SignatureError {
    /// Short stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidFormat | Self::InvalidLength(_) | Self::InvalidHex => "invalid_format",
            Self::MalleableSignature => "malleable",
            Self::InvalidRecoveryId(_) | Self::RecoveryFailed => "recovery_failed",
            Self::ExpiredSignature { .. } | Self::FutureTimestamp { .. } => "expired",
            Self::SignerMismatch { .. } => "signer_mismatch",
            Self::UnsupportedChain(_) => "unsupported_chain",
            Self::VerificationTimeout { .. } => "timeout",
        }
    }
}
