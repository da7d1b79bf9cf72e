//! # Signature Verification (QG-02)
//!
//! Proves that a claimed approver signed an approval, on the operation's
//! own chain or from another chain.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): secp256k1 recovery, message framing
//! - **Ports Layer** (`ports/`): [`ChainVerifier`]
//! - **Service Layer** (`service.rs`): [`EvmSignatureVerifier`]
//! - **Registry** (`registry.rs`): one verifier per chain id
//!
//! ## Security Notes
//!
//! - **Malleability Prevention (EIP-2)**: signatures with high S are rejected
//! - **Replay Protection**: cross-chain signatures bind the `(source,
//!   destination)` chain pair; transaction hashes bind the chain id
//! - **Freshness**: signatures older than `max_signature_age` are rejected
//! - **Opaque Failures**: errors are detailed in logs; callers should surface
//!   only "verification failed"

pub mod domain;
pub mod ports;
pub mod registry;
pub mod service;

pub use domain::ecdsa::{address_from_pubkey, recover_signer};
pub use domain::entities::{
    ApprovalSignature, EcdsaSignature, SignedTransaction, VerificationMetadata,
    VerificationResult, VerifierConfig, SIGNATURE_LENGTH,
};
pub use domain::errors::SignatureError;
pub use domain::messages::{
    cross_chain_message_hash, cross_chain_payload, personal_message_hash,
    PERSONAL_MESSAGE_PREFIX,
};
pub use ports::inbound::ChainVerifier;
pub use registry::VerifierRegistry;
pub use service::EvmSignatureVerifier;
