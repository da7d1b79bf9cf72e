//! # Quorum-Gate Benchmarks
//!
//! criterion groups per component, registered from `benches/qg_benchmarks.rs`.

pub mod rule_evaluation;
pub mod signature_verification;
pub mod workflow_throughput;
