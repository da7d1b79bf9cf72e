//! # Domain Layer
//!
//! The workflow state machine and the approval message format.

pub mod entities;
pub mod errors;
pub mod message;
