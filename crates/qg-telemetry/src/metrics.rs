//! Prometheus metrics for Quorum-Gate.
//!
//! All metrics follow the naming convention: `qg_<component>_<metric>_<unit>`
//!
//! Metrics live in a crate-owned [`REGISTRY`]; [`register_metrics`] adds
//! them once and [`gather_metrics`] renders the text exposition format.

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};
use std::sync::OnceLock;

use crate::TelemetryError;

lazy_static! {
    /// Registry holding every Quorum-Gate metric
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // RULE ENGINE
    // =========================================================================

    /// Rule-set mutations by operation (add/update/delete)
    pub static ref RULE_MUTATIONS: CounterVec = CounterVec::new(
        Opts::new("qg_rules_mutations_total", "Rule-set mutations"),
        &["operation"]
    ).expect("metric creation failed");

    // =========================================================================
    // WORKFLOWS
    // =========================================================================

    /// Workflows created
    pub static ref WORKFLOWS_CREATED: Counter = Counter::new(
        "qg_workflows_created_total",
        "Total number of approval workflows created"
    ).expect("metric creation failed");

    /// Terminal transitions by resulting status (approved/rejected/expired)
    pub static ref WORKFLOW_TRANSITIONS: CounterVec = CounterVec::new(
        Opts::new("qg_workflows_transitions_total", "Workflow transitions to a terminal status"),
        &["status"]
    ).expect("metric creation failed");

    /// Workflows currently pending
    pub static ref PENDING_WORKFLOWS: Gauge = Gauge::new(
        "qg_workflows_pending",
        "Workflows currently awaiting approval"
    ).expect("metric creation failed");

    /// Terminal workflows deleted after retention
    pub static ref WORKFLOWS_PURGED: Counter = Counter::new(
        "qg_workflows_purged_total",
        "Terminal workflows removed by the cleanup sweep"
    ).expect("metric creation failed");

    /// Approvals accepted
    pub static ref APPROVALS_ACCEPTED: Counter = Counter::new(
        "qg_approvals_accepted_total",
        "Approvals appended to a workflow"
    ).expect("metric creation failed");

    /// Approvals refused, by reason
    pub static ref APPROVALS_REFUSED: CounterVec = CounterVec::new(
        Opts::new("qg_approvals_refused_total", "Approvals refused by reason"),
        &["reason"]
    ).expect("metric creation failed");

    // =========================================================================
    // SIGNATURES
    // =========================================================================

    /// Signature verifications by path (direct/cross_chain)
    pub static ref SIGNATURE_VERIFICATIONS: CounterVec = CounterVec::new(
        Opts::new("qg_signature_verifications_total", "Signature verifications"),
        &["path"]
    ).expect("metric creation failed");

    /// Failed signature verifications by path
    pub static ref SIGNATURE_FAILURES: CounterVec = CounterVec::new(
        Opts::new("qg_signature_failures_total", "Failed signature verifications"),
        &["path"]
    ).expect("metric creation failed");

    /// Signature verification duration
    pub static ref SIGNATURE_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "qg_signature_verification_duration_seconds",
            "Time spent verifying approval signatures"
        ).buckets(exponential_buckets(0.00005, 2.0, 14).expect("bucket creation failed"))
    ).expect("metric creation failed");
}

static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();

/// Register all metrics with [`REGISTRY`]. Safe to call more than once.
pub fn register_metrics() -> Result<(), TelemetryError> {
    REGISTERED
        .get_or_init(|| {
            let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
                Box::new(RULE_MUTATIONS.clone()),
                Box::new(WORKFLOWS_CREATED.clone()),
                Box::new(WORKFLOW_TRANSITIONS.clone()),
                Box::new(PENDING_WORKFLOWS.clone()),
                Box::new(WORKFLOWS_PURGED.clone()),
                Box::new(APPROVALS_ACCEPTED.clone()),
                Box::new(APPROVALS_REFUSED.clone()),
                Box::new(SIGNATURE_VERIFICATIONS.clone()),
                Box::new(SIGNATURE_FAILURES.clone()),
                Box::new(SIGNATURE_DURATION.clone()),
            ];
            metrics
                .into_iter()
                .try_for_each(|metric| REGISTRY.register(metric))
                .map_err(|e| e.to_string())
        })
        .clone()
        .map_err(TelemetryError::MetricsInit)
}

/// Encode all metrics as Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    register_metrics()?;

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::Encoding(e.to_string()))?;

    String::from_utf8(buffer).map_err(|e| TelemetryError::Encoding(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}
