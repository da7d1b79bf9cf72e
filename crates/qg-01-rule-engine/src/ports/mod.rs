//! # Ports Layer
//!
//! - **Inbound (Driving)**: API that policy administrators and the workflow
//!   manager call

pub mod inbound;
