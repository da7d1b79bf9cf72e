//! # Verifier Registry
//!
//! One [`ChainVerifier`] per chain id. Missing verifiers are created on
//! first use from the default [`VerifierConfig`] rebound to the requested
//! chain. A verifier is always filed under its own `chain_id()`.

use crate::domain::entities::VerifierConfig;
use crate::ports::inbound::ChainVerifier;
use crate::service::EvmSignatureVerifier;
use parking_lot::RwLock;
use shared_types::{ApprovalConfig, ChainId, SystemTimeSource, TimeSource};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

pub struct VerifierRegistry {
    defaults: VerifierConfig,
    clock: Arc<dyn TimeSource>,
    verifiers: RwLock<HashMap<ChainId, Arc<dyn ChainVerifier>>>,
}

impl VerifierRegistry {
    pub fn new(defaults: VerifierConfig, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            defaults,
            clock,
            verifiers: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &ApprovalConfig) -> Self {
        Self::new(VerifierConfig::from(config), Arc::new(SystemTimeSource))
    }

    /// Verifier for `chain_id`, created from defaults if absent.
    pub fn get_verifier(&self, chain_id: ChainId) -> Arc<dyn ChainVerifier> {
        if let Some(existing) = self.verifiers.read().get(&chain_id) {
            return Arc::clone(existing);
        }

        let mut verifiers = self.verifiers.write();
        let verifier = verifiers.entry(chain_id).or_insert_with(|| {
            info!(chain_id, "Creating default verifier");
            let created: Arc<dyn ChainVerifier> = Arc::new(EvmSignatureVerifier::new(
                self.defaults.with_chain_id(chain_id),
                Arc::clone(&self.clock),
            ));
            created
        });
        Arc::clone(verifier)
    }

    /// File `verifier` under its own chain id, returning any replaced one.
    pub fn register_verifier(
        &self,
        verifier: Arc<dyn ChainVerifier>,
    ) -> Option<Arc<dyn ChainVerifier>> {
        let chain_id = verifier.chain_id();
        info!(chain_id, "Registering verifier");
        self.verifiers.write().insert(chain_id, verifier)
    }

    pub fn remove_verifier(&self, chain_id: ChainId) -> Option<Arc<dyn ChainVerifier>> {
        let removed = self.verifiers.write().remove(&chain_id);
        if removed.is_some() {
            info!(chain_id, "Removed verifier");
        }
        removed
    }

    /// Chains with an instantiated verifier, ascending.
    pub fn registered_chains(&self) -> Vec<ChainId> {
        let mut chains: Vec<ChainId> = self.verifiers.read().keys().copied().collect();
        chains.sort_unstable();
        chains
    }

    pub fn defaults(&self) -> &VerifierConfig {
        &self.defaults
    }
}
