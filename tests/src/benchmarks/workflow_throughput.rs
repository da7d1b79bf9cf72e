//! Full create → approve cycle through the gate.

use crate::fixtures::{transfer, transfer_rule, Approver, T0};
use criterion::{black_box, Criterion};
use qg_03_workflow_manager::{ApprovalGate, WorkflowManagerApi};
use shared_types::{ApprovalConfig, ManualTimeSource, TimeSource};
use std::sync::Arc;

pub fn create_and_approve(c: &mut Criterion) {
    let clock = Arc::new(ManualTimeSource::new(T0));
    let gate = ApprovalGate::with_clock(
        ApprovalConfig::for_chain(1),
        Arc::clone(&clock) as Arc<dyn TimeSource>,
    )
    .expect("valid config");
    let (a, b) = (Approver::random(), Approver::random());
    gate.add_rule(transfer_rule("bench", 0, 2, &[&a, &b]))
        .expect("valid rule");

    c.bench_function("qg-03-create-approve-2of2", |bench| {
        bench.iter(|| {
            let workflows = gate.workflows();
            let wf = workflows
                .create_workflow(transfer(1, 10))
                .expect("rule matches");
            let now = clock.now();
            for approver in [&a, &b] {
                let message = workflows
                    .approval_message(wf.id, &approver.address, now)
                    .expect("workflow exists");
                let signature = approver.sign(&message, now);
                black_box(
                    workflows
                        .submit_approval(wf.id, approver.address, signature, None)
                        .expect("approval accepted"),
                );
            }
            workflows.cleanup_expired_workflows();
        })
    });
}

pub fn register_benchmarks(c: &mut Criterion) {
    create_and_approve(c);
}
