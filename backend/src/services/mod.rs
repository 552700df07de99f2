//! Business logic services for the aquafarm server

pub mod auth;
pub mod pond;
pub mod sampling;
pub mod species;
pub mod stock;

pub use auth::AuthService;
pub use pond::PondService;
pub use sampling::SamplingService;
pub use species::SpeciesService;
pub use stock::StockService;
