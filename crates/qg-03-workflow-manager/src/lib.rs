//! # Workflow Manager (QG-03)
//!
//! Tracks each approval request from intake to a terminal status: matches
//! the context against the rule engine, verifies approval signatures
//! (direct or cross-chain) through the verifier registry, counts quorum per
//! matched rule and expires stale requests.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): workflow state machine, approval message
//! - **Ports Layer** (`ports/`): [`WorkflowManagerApi`] inbound;
//!   [`RuleEvaluator`] and [`ApprovalVerifier`] outbound
//! - **Adapters** (`adapters/`): outbound ports over `RuleEngine` and
//!   `VerifierRegistry`
//! - **Service Layer** (`service.rs`): [`WorkflowManager`]
//! - **Gate** (`gate.rs`): [`ApprovalGate`], builds everything from one
//!   `ApprovalConfig`
//!
//! ## State Machine
//!
//! ```text
//! pending ──(any matched rule reaches quorum)──► approved
//!    │──────(one authorized rejection)─────────► rejected
//!    └──────(past expires_at)─────────────────► expired
//! ```
//!
//! Terminal states never change. Expiry is enforced lazily on every
//! approval or rejection and eagerly by [`spawn_cleanup_task`].

pub mod adapters;
pub mod cleanup;
pub mod config;
pub mod domain;
pub mod gate;
pub mod ports;
pub mod service;

pub use cleanup::spawn_cleanup_task;
pub use config::WorkflowConfig;
pub use domain::entities::{
    Approval, CleanupReport, RuleProgress, WorkflowState, WorkflowStats, WorkflowStatus,
};
pub use domain::errors::WorkflowError;
pub use domain::message::{approval_message, APPROVAL_DOMAIN};
pub use gate::ApprovalGate;
pub use ports::inbound::WorkflowManagerApi;
pub use ports::outbound::{ApprovalVerifier, RuleEvaluator, SignaturePath};
pub use service::WorkflowManager;
