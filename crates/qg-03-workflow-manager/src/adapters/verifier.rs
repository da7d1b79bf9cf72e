//! [`ApprovalVerifier`] over the [`VerifierRegistry`].
//!
//! Picks the verifier of the workflow's chain and records verification
//! metrics. The detailed failure was already logged by the verifier.

use crate::ports::outbound::{ApprovalVerifier, SignaturePath};
use qg_02_signature_verification::{ApprovalSignature, SignatureError, VerifierRegistry};
use qg_telemetry::metrics::{SIGNATURE_DURATION, SIGNATURE_FAILURES, SIGNATURE_VERIFICATIONS};
use qg_telemetry::HistogramTimer;
use shared_types::{Address, ChainId};

impl ApprovalVerifier for VerifierRegistry {
    fn verify_approval(
        &self,
        destination_chain_id: ChainId,
        path: SignaturePath,
        message: &[u8],
        approver: &Address,
        signature: &ApprovalSignature,
    ) -> Result<(), SignatureError> {
        let _timer = HistogramTimer::new(&SIGNATURE_DURATION);
        SIGNATURE_VERIFICATIONS.with_label_values(&[path.label()]).inc();

        let verifier = self.get_verifier(destination_chain_id);
        let result = match path {
            SignaturePath::Direct => {
                verifier.verify_evm_signature(message, signature, Some(approver))
            }
            SignaturePath::CrossChain { source_chain_id } => verifier
                .verify_cross_chain_signature(message, source_chain_id, signature, Some(approver)),
        };

        result.into_result().map(|_| ()).map_err(|e| {
            SIGNATURE_FAILURES.with_label_values(&[path.label()]).inc();
            e
        })
    }
}
