//! # Error Types
//!
//! Errors for the shared primitives and configuration.

use thiserror::Error;

/// Errors parsing an EVM address.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AddressError {
    /// Wrong number of hex digits.
    #[error("Invalid address length: {input} has {length} hex digits, need 40")]
    InvalidLength { input: String, length: usize },

    /// Non-hex characters.
    #[error("Invalid address hex: {0}")]
    InvalidHex(String),
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `chain_id` was not provided.
    #[error("Missing required option: chain_id")]
    MissingChainId,

    /// An option has an out-of-range value.
    #[error("Invalid value for {option}: {reason}")]
    InvalidValue { option: &'static str, reason: String },

    /// An environment variable could not be parsed.
    #[error("Cannot parse environment variable {var}={value}")]
    Unparsable { var: &'static str, value: String },
}
