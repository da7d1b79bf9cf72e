//! # Domain Layer
//!
//! Rules, conditions and the rule-set commitment. No locking, no clock.

pub mod commitment;
pub mod conditions;
pub mod entities;
pub mod errors;
