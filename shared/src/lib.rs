//! Shared types and rules for the aquafarm tracker
//!
//! This crate holds everything that does not need a database: the domain
//! models, batch aggregation, growth evaluation and stock lifecycle
//! rules. The backend and the WASM preview build on it.

pub mod aggregation;
pub mod error;
pub mod growth;
pub mod models;
pub mod types;
pub mod validation;

pub use aggregation::*;
pub use error::*;
pub use growth::*;
pub use models::*;
pub use types::*;
pub use validation::*;
