//! Approval signature verification, direct and cross-chain.

use crate::fixtures::{Approver, T0};
use criterion::{black_box, Criterion};
use qg_02_signature_verification::{
    recover_signer, ChainVerifier, EvmSignatureVerifier, VerifierConfig, VerifierRegistry,
};
use shared_types::{keccak256, ApprovalConfig, ManualTimeSource, TimeSource};
use std::sync::Arc;

const MESSAGE: &[u8] = br#"{"approver":"0x00","chain_id":1,"domain":"bench"}"#;

fn verifier(chain_id: u64) -> EvmSignatureVerifier {
    let clock: Arc<dyn TimeSource> = Arc::new(ManualTimeSource::new(T0));
    EvmSignatureVerifier::new(
        VerifierConfig::from(&ApprovalConfig::for_chain(chain_id)),
        clock,
    )
}

pub fn recover(c: &mut Criterion) {
    let approver = Approver::random();
    let hash = keccak256(MESSAGE);
    let signature = approver.sign_hash(&hash, T0).signature;

    c.bench_function("qg-02-recover-signer", |b| {
        b.iter(|| black_box(recover_signer(&hash, &signature)))
    });
}

pub fn verify_paths(c: &mut Criterion) {
    let approver = Approver::random();
    let verifier = verifier(1);
    let direct = approver.sign(MESSAGE, T0);
    let cross = approver.sign_cross_chain(137, 1, MESSAGE, T0);

    let mut group = c.benchmark_group("qg-02-verify");
    group.bench_function("direct", |b| {
        b.iter(|| {
            black_box(verifier.verify_evm_signature(MESSAGE, &direct, Some(&approver.address)))
        })
    });
    group.bench_function("cross_chain", |b| {
        b.iter(|| {
            black_box(verifier.verify_cross_chain_signature(
                MESSAGE,
                137,
                &cross,
                Some(&approver.address),
            ))
        })
    });
    group.finish();
}

pub fn registry_lookup(c: &mut Criterion) {
    let registry = VerifierRegistry::from_config(&ApprovalConfig::for_chain(1));
    for chain in [1, 10, 56, 137, 42161] {
        registry.get_verifier(chain);
    }

    c.bench_function("qg-02-registry-get", |b| {
        b.iter(|| black_box(registry.get_verifier(black_box(137))))
    });
}

pub fn register_benchmarks(c: &mut Criterion) {
    recover(c);
    verify_paths(c);
    registry_lookup(c);
}
