//! # Domain Layer
//!
//! Pure cryptographic logic with no I/O and no shared state.

pub mod ecdsa;
pub mod entities;
pub mod errors;
pub mod messages;
