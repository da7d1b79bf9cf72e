//! # Inbound Ports (Driving Ports / API)
//!
//! A chain-bound verifier. Implementations must be thread-safe.

use crate::domain::entities::{ApprovalSignature, SignedTransaction, VerificationResult};
use shared_types::{Address, ChainId};

/// Signature verification for one chain.
///
/// Every method reports failures through [`VerificationResult::error`]
/// rather than a `Result`, so the metadata of a failed attempt is kept.
pub trait ChainVerifier: Send + Sync {
    /// Chain this verifier is bound to.
    fn chain_id(&self) -> ChainId;

    /// Verify a personal-message signature.
    ///
    /// Fails with `ExpiredSignature` if the signature is older than the
    /// configured maximum age and with `SignerMismatch` if `expected_signer`
    /// is given and differs from the recovered address.
    fn verify_evm_signature(
        &self,
        message: &[u8],
        signature: &ApprovalSignature,
        expected_signer: Option<&Address>,
    ) -> VerificationResult;

    /// Recover the signer of a transaction whose chain id is supported.
    fn verify_transaction_signature(
        &self,
        transaction: &SignedTransaction,
        expected_signer: Option<&Address>,
    ) -> VerificationResult;

    /// Verify a signature over `message` bound to `(source_chain_id,
    /// self.chain_id())`. Unsupported sources fail before any hashing.
    fn verify_cross_chain_signature(
        &self,
        message: &[u8],
        source_chain_id: ChainId,
        signature: &ApprovalSignature,
        expected_signer: Option<&Address>,
    ) -> VerificationResult;
}
