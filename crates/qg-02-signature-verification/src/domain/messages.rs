//! # Signed Message Framing
//!
//! Approvals are signed as EVM personal messages:
//!
//! ```text
//! keccak256("\x19Ethereum Signed Message:\n" || len(message) || message)
//! ```
//!
//! Cross-chain approvals prepend the chain pair before that framing:
//!
//! ```text
//! source_chain_id (u64 BE) || destination_chain_id (u64 BE) || message
//! ```

use sha3::{Digest, Keccak256};
use shared_types::{ChainId, Hash};

/// Standard EVM personal-message prefix.
pub const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Digest of `message` under the personal-message prefix.
pub fn personal_message_hash(message: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_MESSAGE_PREFIX.as_bytes());
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// Bind `message` to an ordered chain pair.
pub fn cross_chain_payload(source: ChainId, destination: ChainId, message: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(16 + message.len());
    payload.extend_from_slice(&source.to_be_bytes());
    payload.extend_from_slice(&destination.to_be_bytes());
    payload.extend_from_slice(message);
    payload
}

/// Digest a cross-chain approver signs.
pub fn cross_chain_message_hash(source: ChainId, destination: ChainId, message: &[u8]) -> Hash {
    personal_message_hash(&cross_chain_payload(source, destination, message))
}
