//! HTTP handlers for the aquafarm API

mod auth;
mod health;
mod pond;
mod sampling;
mod species;
mod stock;

pub use auth::*;
pub use health::*;
pub use pond::*;
pub use sampling::*;
pub use species::*;
pub use stock::*;
