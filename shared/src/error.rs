//! Domain errors raised by the aquafarm rules
//!
//! Every variant knows which input field it is attributed to, so the
//! collaborator layer can report structured, field-level failures.

use chrono::NaiveDate;
use thiserror::Error;

/// Failures of the pond, stock and sampling rules
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FarmError {
    /// Malformed or out-of-range raw data (batch size, weights, counts)
    #[error("{field}: {message}")]
    InvalidInput { field: String, message: String },

    #[error("An active stock for this species already exists in this pond")]
    DuplicateActiveStock,

    #[error("A sampling for this fish stock already exists on {0}")]
    DuplicateSamplingDate(NaiveDate),

    #[error("Cannot add sampling to a closed stock")]
    StockNotActive,

    #[error("Stock is already closed")]
    AlreadyClosed,

    /// Date ordering violations
    #[error("{field}: {message}")]
    InvalidDate { field: String, message: String },

    /// Growth percentage against a zero or missing baseline
    #[error("Growth percentage is undefined without a non-zero baseline")]
    DivisionUndefined,
}

impl FarmError {
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        FarmError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_date(field: impl Into<String>, message: impl Into<String>) -> Self {
        FarmError::InvalidDate {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            FarmError::InvalidInput { .. } => "INVALID_INPUT",
            FarmError::DuplicateActiveStock => "DUPLICATE_ACTIVE_STOCK",
            FarmError::DuplicateSamplingDate(_) => "DUPLICATE_SAMPLING_DATE",
            FarmError::StockNotActive => "STOCK_NOT_ACTIVE",
            FarmError::AlreadyClosed => "ALREADY_CLOSED",
            FarmError::InvalidDate { .. } => "INVALID_DATE",
            FarmError::DivisionUndefined => "DIVISION_UNDEFINED",
        }
    }

    /// Input field the failure is attributed to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            FarmError::InvalidInput { field, .. } | FarmError::InvalidDate { field, .. } => {
                Some(field)
            }
            FarmError::DuplicateActiveStock => Some("species_id"),
            FarmError::DuplicateSamplingDate(_) => Some("sampled_on"),
            FarmError::StockNotActive => Some("fish_stock"),
            FarmError::AlreadyClosed => Some("status"),
            FarmError::DivisionUndefined => None,
        }
    }
}

pub type FarmResult<T> = Result<T, FarmError>;
