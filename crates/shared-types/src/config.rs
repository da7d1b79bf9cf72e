//! Engine-wide configuration.
//!
//! # Example
//!
//! ```ignore
//! use shared_types::ApprovalConfigBuilder;
//!
//! let config = ApprovalConfigBuilder::new()
//!     .chain_id(1)
//!     .max_pending_workflows(500)
//!     .build()
//!     .expect("Valid config");
//! ```

use crate::entities::ChainId;
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::env;
use std::time::Duration;

/// Chains every deployment accepts cross-chain approvals from, in addition
/// to its own chain: Ethereum, Optimism, BNB Chain, Polygon, Arbitrum One.
pub const DEFAULT_SUPPORTED_CHAINS: [ChainId; 5] = [1, 10, 56, 137, 42161];

/// Configuration shared by the rule engine, verifiers and workflow manager.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalConfig {
    /// Chain this deployment authorizes operations on.
    pub chain_id: ChainId,
    /// Quorum used when a rule definition omits `required_approvals`.
    pub default_required_approvals: u32,
    /// Rule timeout used when a definition omits it; also the workflow
    /// expiration window.
    pub default_timeout_minutes: u64,
    /// Ceiling on concurrently pending workflows.
    pub max_pending_workflows: usize,
    /// Period of the expiry sweep.
    pub cleanup_interval: Duration,
    /// Wall-clock budget for one signature verification.
    pub verification_timeout: Duration,
    /// Oldest acceptable signature.
    pub max_signature_age: Duration,
    /// How long terminal workflows are kept before the sweep deletes them.
    pub terminal_retention: Duration,
    /// Chains accepted as cross-chain approval sources.
    pub supported_chains: BTreeSet<ChainId>,
}

impl ApprovalConfig {
    /// Defaults for every option except the chain id.
    pub fn for_chain(chain_id: ChainId) -> Self {
        let mut supported_chains: BTreeSet<ChainId> =
            DEFAULT_SUPPORTED_CHAINS.iter().copied().collect();
        supported_chains.insert(chain_id);

        Self {
            chain_id,
            default_required_approvals: 2,
            default_timeout_minutes: 60,
            max_pending_workflows: 1000,
            cleanup_interval: Duration::from_millis(3_600_000),
            verification_timeout: Duration::from_millis(5_000),
            max_signature_age: Duration::from_millis(86_400_000),
            terminal_retention: Duration::from_millis(86_400_000),
            supported_chains,
        }
    }

    /// Validate option ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_required_approvals == 0 {
            return Err(ConfigError::InvalidValue {
                option: "default_required_approvals",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.default_timeout_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                option: "default_timeout_minutes",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_pending_workflows == 0 {
            return Err(ConfigError::InvalidValue {
                option: "max_pending_workflows",
                reason: "must be at least 1".to_string(),
            });
        }
        for (option, value) in [
            ("cleanup_interval", self.cleanup_interval),
            ("verification_timeout", self.verification_timeout),
            ("max_signature_age", self.max_signature_age),
        ] {
            if value.is_zero() {
                return Err(ConfigError::InvalidValue {
                    option,
                    reason: "must be non-zero".to_string(),
                });
            }
        }
        if !self.supported_chains.contains(&self.chain_id) {
            return Err(ConfigError::InvalidValue {
                option: "supported_chains",
                reason: format!("must include the local chain {}", self.chain_id),
            });
        }
        Ok(())
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QG_CHAIN_ID` (required)
    /// - `QG_DEFAULT_REQUIRED_APPROVALS` (default: 2)
    /// - `QG_DEFAULT_TIMEOUT_MINUTES` (default: 60)
    /// - `QG_MAX_PENDING_WORKFLOWS` (default: 1000)
    /// - `QG_CLEANUP_INTERVAL_MS` (default: 3600000)
    /// - `QG_VERIFICATION_TIMEOUT_MS` (default: 5000)
    /// - `QG_MAX_SIGNATURE_AGE_MS` (default: 86400000)
    /// - `QG_TERMINAL_RETENTION_MS` (default: 86400000)
    /// - `QG_SUPPORTED_CHAINS`: comma-separated chain ids, replaces the default set
    pub fn from_env() -> Result<Self, ConfigError> {
        let chain_id: ChainId = env_parse("QG_CHAIN_ID")?.ok_or(ConfigError::MissingChainId)?;
        let mut builder = ApprovalConfigBuilder::new().chain_id(chain_id);

        if let Some(v) = env_parse("QG_DEFAULT_REQUIRED_APPROVALS")? {
            builder = builder.default_required_approvals(v);
        }
        if let Some(v) = env_parse("QG_DEFAULT_TIMEOUT_MINUTES")? {
            builder = builder.default_timeout_minutes(v);
        }
        if let Some(v) = env_parse("QG_MAX_PENDING_WORKFLOWS")? {
            builder = builder.max_pending_workflows(v);
        }
        if let Some(ms) = env_parse("QG_CLEANUP_INTERVAL_MS")? {
            builder = builder.cleanup_interval(Duration::from_millis(ms));
        }
        if let Some(ms) = env_parse("QG_VERIFICATION_TIMEOUT_MS")? {
            builder = builder.verification_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = env_parse("QG_MAX_SIGNATURE_AGE_MS")? {
            builder = builder.max_signature_age(Duration::from_millis(ms));
        }
        if let Some(ms) = env_parse("QG_TERMINAL_RETENTION_MS")? {
            builder = builder.terminal_retention(Duration::from_millis(ms));
        }
        if let Ok(raw) = env::var("QG_SUPPORTED_CHAINS") {
            let chains = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse::<ChainId>().map_err(|_| ConfigError::Unparsable {
                        var: "QG_SUPPORTED_CHAINS",
                        value: raw.clone(),
                    })
                })
                .collect::<Result<BTreeSet<_>, _>>()?;
            builder = builder.supported_chains(chains);
        }

        builder.build()
    }
}

fn env_parse<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Unparsable { var, value }),
        Err(_) => Ok(None),
    }
}

/// Builder for [`ApprovalConfig`] with validation.
#[derive(Default)]
pub struct ApprovalConfigBuilder {
    chain_id: Option<ChainId>,
    default_required_approvals: Option<u32>,
    default_timeout_minutes: Option<u64>,
    max_pending_workflows: Option<usize>,
    cleanup_interval: Option<Duration>,
    verification_timeout: Option<Duration>,
    max_signature_age: Option<Duration>,
    terminal_retention: Option<Duration>,
    supported_chains: Option<BTreeSet<ChainId>>,
}

impl ApprovalConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chain_id(mut self, chain_id: ChainId) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn default_required_approvals(mut self, approvals: u32) -> Self {
        self.default_required_approvals = Some(approvals);
        self
    }

    pub fn default_timeout_minutes(mut self, minutes: u64) -> Self {
        self.default_timeout_minutes = Some(minutes);
        self
    }

    pub fn max_pending_workflows(mut self, max: usize) -> Self {
        self.max_pending_workflows = Some(max);
        self
    }

    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    pub fn verification_timeout(mut self, timeout: Duration) -> Self {
        self.verification_timeout = Some(timeout);
        self
    }

    pub fn max_signature_age(mut self, age: Duration) -> Self {
        self.max_signature_age = Some(age);
        self
    }

    pub fn terminal_retention(mut self, retention: Duration) -> Self {
        self.terminal_retention = Some(retention);
        self
    }

    /// Replace the supported source chains. The local chain is always added.
    pub fn supported_chains(mut self, chains: impl IntoIterator<Item = ChainId>) -> Self {
        self.supported_chains = Some(chains.into_iter().collect());
        self
    }

    /// Build the config, validating all parameters.
    pub fn build(self) -> Result<ApprovalConfig, ConfigError> {
        let chain_id = self.chain_id.ok_or(ConfigError::MissingChainId)?;
        let defaults = ApprovalConfig::for_chain(chain_id);

        let mut supported_chains = self.supported_chains.unwrap_or(defaults.supported_chains);
        supported_chains.insert(chain_id);

        let config = ApprovalConfig {
            chain_id,
            default_required_approvals: self
                .default_required_approvals
                .unwrap_or(defaults.default_required_approvals),
            default_timeout_minutes: self
                .default_timeout_minutes
                .unwrap_or(defaults.default_timeout_minutes),
            max_pending_workflows: self
                .max_pending_workflows
                .unwrap_or(defaults.max_pending_workflows),
            cleanup_interval: self.cleanup_interval.unwrap_or(defaults.cleanup_interval),
            verification_timeout: self
                .verification_timeout
                .unwrap_or(defaults.verification_timeout),
            max_signature_age: self.max_signature_age.unwrap_or(defaults.max_signature_age),
            terminal_retention: self
                .terminal_retention
                .unwrap_or(defaults.terminal_retention),
            supported_chains,
        };

        config.validate()?;
        Ok(config)
    }
}
