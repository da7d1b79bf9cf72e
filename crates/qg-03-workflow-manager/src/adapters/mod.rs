//! # Adapters
//!
//! Outbound port implementations over the rule engine and verifier registry.

pub mod rule_engine;
pub mod verifier;
