//! Rule evaluation and commitment rebuild cost against policy-set size.

use crate::fixtures::{transfer, transfer_rule, Approver};
use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use qg_01_rule_engine::{RuleCommitment, RuleDefaults, RuleEngine, RuleEngineApi};
use shared_types::{SystemTimeSource, TimeSource};
use std::sync::Arc;

const SIZES: [usize; 4] = [10, 100, 500, 1_000];

fn engine_with(rules: usize, approvers: &[&Approver]) -> RuleEngine {
    let clock: Arc<dyn TimeSource> = Arc::new(SystemTimeSource);
    let engine = RuleEngine::new(RuleDefaults::default(), clock);
    for i in 0..rules {
        let mut rule = transfer_rule(&format!("rule-{i}"), (i as u64) * 10, 2, approvers);
        rule.priority = (i % 7) as i32;
        engine.add_rule(rule).expect("valid rule");
    }
    engine
}

pub fn evaluate_context(c: &mut Criterion) {
    let approvers: Vec<Approver> = (0..3).map(|_| Approver::random()).collect();
    let refs: Vec<&Approver> = approvers.iter().collect();
    let mut group = c.benchmark_group("qg-01-evaluate");

    for size in SIZES {
        let engine = engine_with(size, &refs);
        let context = transfer(1, (size as u64) * 5);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &context, |b, ctx| {
            b.iter(|| black_box(engine.evaluate_context(ctx)))
        });
    }
    group.finish();
}

pub fn rebuild_commitment(c: &mut Criterion) {
    let approvers: Vec<Approver> = (0..3).map(|_| Approver::random()).collect();
    let refs: Vec<&Approver> = approvers.iter().collect();
    let mut group = c.benchmark_group("qg-01-commitment");

    for size in SIZES {
        let rules = engine_with(size, &refs).get_all_rules();
        group.bench_with_input(BenchmarkId::from_parameter(size), &rules, |b, rules| {
            b.iter(|| black_box(RuleCommitment::build(rules.iter()).root()))
        });
    }
    group.finish();
}

pub fn register_benchmarks(c: &mut Criterion) {
    evaluate_context(c);
    rebuild_commitment(c);
}
