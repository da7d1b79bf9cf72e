//! # Shared Types Crate
//!
//! Types that cross component boundaries in Quorum-Gate.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: addresses, chain ids, timestamps and the
//!   approval context are defined once and shared by every component.
//! - **Copies, not references**: components exchange owned values; no crate
//!   hands out references into another crate's storage.

pub mod config;
pub mod entities;
pub mod errors;
pub mod time;

pub use config::{ApprovalConfig, ApprovalConfigBuilder};
pub use entities::*;
pub use errors::*;
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource};
