//! # Ports Layer
//!
//! - **Inbound (Driving)**: [`inbound::WorkflowManagerApi`]
//! - **Outbound (Driven)**: rule evaluation and signature verification

pub mod inbound;
pub mod outbound;
