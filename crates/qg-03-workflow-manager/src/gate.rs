//! # Approval Gate
//!
//! Composition root: one [`ApprovalConfig`] builds the rule engine, the
//! verifier registry and the workflow manager, wired through the outbound
//! ports. Rule mutations go through the gate so they are counted.

use crate::cleanup::spawn_cleanup_task;
use crate::config::WorkflowConfig;
use crate::ports::outbound::{ApprovalVerifier, RuleEvaluator};
use crate::service::WorkflowManager;
use qg_01_rule_engine::{
    Rule, RuleDefaults, RuleDefinition, RuleEngine, RuleEngineApi, RuleError, RuleUpdate,
};
use qg_02_signature_verification::{VerifierConfig, VerifierRegistry};
use qg_telemetry::metrics::RULE_MUTATIONS;
use shared_types::{ApprovalConfig, ConfigError, SystemTimeSource, TimeSource};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub struct ApprovalGate {
    config: ApprovalConfig,
    rules: Arc<RuleEngine>,
    verifiers: Arc<VerifierRegistry>,
    workflows: Arc<WorkflowManager>,
}

impl ApprovalGate {
    /// Validate `config` and build every component on the system clock.
    pub fn new(config: ApprovalConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, Arc::new(SystemTimeSource))
    }

    /// As [`ApprovalGate::new`], with every component reading `clock`.
    pub fn with_clock(
        config: ApprovalConfig,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if let Err(e) = qg_telemetry::register_metrics() {
            warn!(error = %e, "Metrics registration failed");
        }

        let rules = Arc::new(RuleEngine::new(
            RuleDefaults::from(&config),
            Arc::clone(&clock),
        ));
        let verifiers = Arc::new(VerifierRegistry::new(
            VerifierConfig::from(&config),
            Arc::clone(&clock),
        ));
        let workflows = Arc::new(WorkflowManager::new(
            WorkflowConfig::from(&config),
            Arc::clone(&rules) as Arc<dyn RuleEvaluator>,
            Arc::clone(&verifiers) as Arc<dyn ApprovalVerifier>,
            clock,
        ));

        info!(
            chain_id = config.chain_id,
            supported_chains = config.supported_chains.len(),
            "Approval gate assembled"
        );
        Ok(Self {
            config,
            rules,
            verifiers,
            workflows,
        })
    }

    pub fn config(&self) -> &ApprovalConfig {
        &self.config
    }

    /// Read access to the policy set. Mutate through the gate.
    pub fn rule_engine(&self) -> &Arc<RuleEngine> {
        &self.rules
    }

    pub fn verifiers(&self) -> &Arc<VerifierRegistry> {
        &self.verifiers
    }

    pub fn workflows(&self) -> &Arc<WorkflowManager> {
        &self.workflows
    }

    pub fn add_rule(&self, definition: RuleDefinition) -> Result<Rule, RuleError> {
        let rule = self.rules.add_rule(definition)?;
        RULE_MUTATIONS.with_label_values(&["add"]).inc();
        Ok(rule)
    }

    pub fn update_rule(&self, id: &str, update: RuleUpdate) -> Result<Rule, RuleError> {
        let rule = self.rules.update_rule(id, update)?;
        RULE_MUTATIONS.with_label_values(&["update"]).inc();
        Ok(rule)
    }

    pub fn delete_rule(&self, id: &str) -> Result<Rule, RuleError> {
        let rule = self.rules.delete_rule(id)?;
        RULE_MUTATIONS.with_label_values(&["delete"]).inc();
        Ok(rule)
    }

    /// Spawn the periodic expiry sweep at the configured interval.
    pub fn start_cleanup(&self) -> JoinHandle<()> {
        let interval = self.workflows.config().cleanup_interval;
        spawn_cleanup_task(Arc::clone(&self.workflows), interval)
    }
}
