//! # EVM Signature Verifier
//!
//! Implements [`ChainVerifier`] for secp256k1 / personal-message chains.
//!
//! Freshness and chain support are checked before recovery. Recovery runs
//! under a wall-clock budget; an overrun is a failure, never a pass.

use crate::domain::ecdsa;
use crate::domain::entities::{
    ApprovalSignature, EcdsaSignature, SignedTransaction, VerificationMetadata,
    VerificationResult, VerifierConfig,
};
use crate::domain::errors::SignatureError;
use crate::domain::messages::{cross_chain_message_hash, personal_message_hash};
use crate::ports::inbound::ChainVerifier;
use shared_types::{
    format_address, Address, ChainId, Hash, SystemTimeSource, TimeSource, Timestamp,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Verifier bound to one EVM chain.
pub struct EvmSignatureVerifier {
    config: VerifierConfig,
    clock: Arc<dyn TimeSource>,
}

impl EvmSignatureVerifier {
    pub fn new(config: VerifierConfig, clock: Arc<dyn TimeSource>) -> Self {
        Self { config, clock }
    }

    pub fn with_system_clock(config: VerifierConfig) -> Self {
        Self::new(config, Arc::new(SystemTimeSource))
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    fn check_freshness(&self, signed_at: Timestamp, now: Timestamp) -> Result<(), SignatureError> {
        let max_age_ms = self.config.max_signature_age.as_millis() as u64;
        let max_skew_ms = self.config.max_clock_skew.as_millis() as u64;

        if signed_at > now {
            let ahead_ms = signed_at - now;
            if ahead_ms > max_skew_ms {
                return Err(SignatureError::FutureTimestamp { ahead_ms });
            }
            return Ok(());
        }

        let age_ms = now - signed_at;
        if age_ms > max_age_ms {
            return Err(SignatureError::ExpiredSignature { age_ms, max_age_ms });
        }
        Ok(())
    }

    fn recover_within_budget(
        &self,
        message_hash: &Hash,
        signature: &EcdsaSignature,
        expected_signer: Option<&Address>,
    ) -> Result<Address, SignatureError> {
        let started = Instant::now();
        let signer = ecdsa::recover_signer(message_hash, signature)?;

        let elapsed = started.elapsed();
        if elapsed > self.config.verification_timeout {
            return Err(SignatureError::VerificationTimeout {
                elapsed_ms: elapsed.as_millis() as u64,
                limit_ms: self.config.verification_timeout.as_millis() as u64,
            });
        }

        match expected_signer {
            Some(expected) if !ecdsa::addresses_equal(expected, &signer) => {
                Err(SignatureError::SignerMismatch {
                    expected: *expected,
                    actual: signer,
                })
            }
            _ => Ok(signer),
        }
    }

    fn finish(
        &self,
        outcome: Result<Address, SignatureError>,
        metadata: VerificationMetadata,
        expected_signer: Option<&Address>,
    ) -> VerificationResult {
        match outcome {
            Ok(signer) => {
                debug!(
                    chain_id = metadata.chain_id,
                    source_chain_id = ?metadata.source_chain_id,
                    signer = %format_address(&signer),
                    "Signature verified"
                );
                VerificationResult::valid(signer, metadata)
            }
            Err(error) => {
                warn!(
                    chain_id = metadata.chain_id,
                    source_chain_id = ?metadata.source_chain_id,
                    expected_signer = ?expected_signer.map(format_address),
                    message_hash = %hex::encode(metadata.message_hash),
                    kind = error.kind(),
                    error = %error,
                    "Signature verification failed"
                );
                VerificationResult::invalid(error, metadata)
            }
        }
    }

    fn metadata(
        &self,
        source_chain_id: Option<ChainId>,
        message_hash: Hash,
        now: Timestamp,
    ) -> VerificationMetadata {
        VerificationMetadata {
            chain_id: self.config.chain_id,
            source_chain_id,
            message_hash,
            verified_at: now,
        }
    }
}

impl ChainVerifier for EvmSignatureVerifier {
    fn chain_id(&self) -> ChainId {
        self.config.chain_id
    }

    fn verify_evm_signature(
        &self,
        message: &[u8],
        signature: &ApprovalSignature,
        expected_signer: Option<&Address>,
    ) -> VerificationResult {
        let now = self.clock.now();
        let message_hash = personal_message_hash(message);
        let metadata = self.metadata(None, message_hash, now);

        let outcome = self
            .check_freshness(signature.timestamp, now)
            .and_then(|_| {
                self.recover_within_budget(&message_hash, &signature.signature, expected_signer)
            });
        self.finish(outcome, metadata, expected_signer)
    }

    fn verify_transaction_signature(
        &self,
        transaction: &SignedTransaction,
        expected_signer: Option<&Address>,
    ) -> VerificationResult {
        let now = self.clock.now();
        let message_hash = transaction.signing_hash();
        let metadata = self.metadata(None, message_hash, now);

        let outcome = if self.config.is_supported(transaction.chain_id) {
            self.recover_within_budget(&message_hash, &transaction.signature, expected_signer)
        } else {
            Err(SignatureError::UnsupportedChain(transaction.chain_id))
        };
        self.finish(outcome, metadata, expected_signer)
    }

    fn verify_cross_chain_signature(
        &self,
        message: &[u8],
        source_chain_id: ChainId,
        signature: &ApprovalSignature,
        expected_signer: Option<&Address>,
    ) -> VerificationResult {
        let now = self.clock.now();

        if !self.config.is_supported(source_chain_id) {
            let metadata = self.metadata(Some(source_chain_id), [0u8; 32], now);
            return self.finish(
                Err(SignatureError::UnsupportedChain(source_chain_id)),
                metadata,
                expected_signer,
            );
        }

        let message_hash = cross_chain_message_hash(source_chain_id, self.config.chain_id, message);
        let metadata = self.metadata(Some(source_chain_id), message_hash, now);

        let outcome = self
            .check_freshness(signature.timestamp, now)
            .and_then(|_| {
                self.recover_within_budget(&message_hash, &signature.signature, expected_signer)
            });
        self.finish(outcome, metadata, expected_signer)
    }
}
