//! # Ports Layer
//!
//! - **Inbound (Driving)**: [`inbound::ChainVerifier`], one per chain

pub mod inbound;
