//! Domain models for the aquafarm tracker

mod pond;
mod sampling;
mod species;
mod stock;
mod user;

pub use pond::*;
pub use sampling::*;
pub use species::*;
pub use stock::*;
pub use user::*;
