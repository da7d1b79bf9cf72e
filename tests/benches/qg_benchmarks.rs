//! # Quorum-Gate Benchmarks
//!
//! | Component | Operation |
//! |-----------|-----------|
//! | qg-01 Rule Engine | evaluate context, rebuild commitment |
//! | qg-02 Signature Verification | recover, direct and cross-chain verify |
//! | qg-03 Workflow Manager | create + 2-of-2 approval cycle |

use criterion::{criterion_group, criterion_main, Criterion};
use qg_tests::benchmarks::{rule_evaluation, signature_verification, workflow_throughput};

fn qg_01(c: &mut Criterion) {
    rule_evaluation::register_benchmarks(c);
}

fn qg_02(c: &mut Criterion) {
    signature_verification::register_benchmarks(c);
}

fn qg_03(c: &mut Criterion) {
    workflow_throughput::register_benchmarks(c);
}

criterion_group!(benches, qg_01, qg_02, qg_03);
criterion_main!(benches);
