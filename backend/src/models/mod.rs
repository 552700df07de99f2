//! Database models for the aquafarm server
//!
//! Re-exports the domain models from the shared crate

pub use shared::models::*;
