//! Pond fish stock models and lifecycle rules
//!
//! A stock is one stocking event of a species in a pond. It is opened
//! ACTIVE and closed exactly once; a closed stock never reopens.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FarmError, FarmResult};
use crate::validation::{validate_initial_avg_weight, validate_not_future, validate_quantity};

/// Lifecycle status of a stock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    Active,
    Closed,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::Active => "active",
            StockStatus::Closed => "closed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Some(StockStatus::Active),
            "closed" => Some(StockStatus::Closed),
            _ => None,
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockStatus::Active => write!(f, "ACTIVE"),
            StockStatus::Closed => write!(f, "CLOSED"),
        }
    }
}

/// A cohort of one species stocked into one pond
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PondFishStock {
    pub id: Uuid,
    pub user_id: Uuid,
    pub pond_id: Uuid,
    pub species_id: Uuid,
    /// Number of fish stocked initially
    pub quantity: i32,
    /// Initial average weight in grams
    pub initial_avg_weight: Option<Decimal>,
    pub stocked_on: NaiveDate,
    pub status: StockStatus,
    /// Set if and only if the stock is closed
    pub closed_on: Option<NaiveDate>,
}

/// Request to open a new stock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStock {
    pub pond_id: Uuid,
    pub species_id: Uuid,
    pub quantity: i32,
    pub initial_avg_weight: Option<Decimal>,
    pub stocked_on: NaiveDate,
}

impl NewStock {
    /// Validate the raw stocking data
    pub fn validate(&self, today: NaiveDate) -> FarmResult<()> {
        validate_quantity(self.quantity)?;
        if let Some(weight) = self.initial_avg_weight {
            validate_initial_avg_weight(weight)?;
        }
        validate_not_future("stocked_on", self.stocked_on, today)
    }

    /// Open an ACTIVE stock, given the stocks that already exist for the owner.
    ///
    /// Fails with `DuplicateActiveStock` when an ACTIVE stock already exists
    /// for the same pond and species.
    pub fn open(
        self,
        id: Uuid,
        user_id: Uuid,
        today: NaiveDate,
        existing: &[PondFishStock],
    ) -> FarmResult<PondFishStock> {
        self.validate(today)?;
        ensure_no_active_stock(existing, self.pond_id, self.species_id)?;

        Ok(PondFishStock {
            id,
            user_id,
            pond_id: self.pond_id,
            species_id: self.species_id,
            quantity: self.quantity,
            initial_avg_weight: self.initial_avg_weight,
            stocked_on: self.stocked_on,
            status: StockStatus::Active,
            closed_on: None,
        })
    }
}

/// At most one ACTIVE stock per (pond, species)
pub fn ensure_no_active_stock(
    existing: &[PondFishStock],
    pond_id: Uuid,
    species_id: Uuid,
) -> FarmResult<()> {
    let clash = existing
        .iter()
        .any(|s| s.is_active() && s.pond_id == pond_id && s.species_id == species_id);

    if clash {
        Err(FarmError::DuplicateActiveStock)
    } else {
        Ok(())
    }
}

impl PondFishStock {
    pub fn is_active(&self) -> bool {
        self.status == StockStatus::Active
    }

    /// Close the stock, returning the closed record.
    ///
    /// The receiver is never modified, so a failed close leaves no trace.
    pub fn close(&self, closed_on: NaiveDate) -> FarmResult<PondFishStock> {
        if self.status == StockStatus::Closed {
            return Err(FarmError::AlreadyClosed);
        }
        if closed_on < self.stocked_on {
            return Err(FarmError::invalid_date(
                "closed_on",
                format!("Closing date cannot be before stocking date ({})", self.stocked_on),
            ));
        }

        Ok(PondFishStock {
            status: StockStatus::Closed,
            closed_on: Some(closed_on),
            ..self.clone()
        })
    }

    /// Check that a sampling on `sampled_on` may be recorded against this stock
    pub fn ensure_accepts_sampling(&self, sampled_on: NaiveDate) -> FarmResult<()> {
        if !self.is_active() {
            return Err(FarmError::StockNotActive);
        }
        if sampled_on < self.stocked_on {
            return Err(FarmError::invalid_date(
                "sampled_on",
                format!("Sampling date cannot be before stocking date ({})", self.stocked_on),
            ));
        }
        Ok(())
    }

    /// Verify the status/closing-date invariants of a loaded record
    pub fn check_invariants(&self) -> FarmResult<()> {
        match (self.status, self.closed_on) {
            (StockStatus::Active, None) => Ok(()),
            (StockStatus::Closed, Some(closed_on)) if closed_on >= self.stocked_on => Ok(()),
            (StockStatus::Closed, Some(_)) => Err(FarmError::invalid_date(
                "closed_on",
                "Closing date cannot be before stocking date",
            )),
            (StockStatus::Closed, None) => Err(FarmError::invalid_date(
                "closed_on",
                "closed_on must be set when closing a stock",
            )),
            (StockStatus::Active, Some(_)) => Err(FarmError::invalid_date(
                "closed_on",
                "An active stock cannot have a closing date",
            )),
        }
    }

    /// Human-readable label, e.g. "Tilapia in North Pond (ACTIVE)"
    pub fn display_name(&self, species_name: &str, pond_name: &str) -> String {
        format!("{} in {} ({})", species_name, pond_name, self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_stock(pond_id: Uuid, species_id: Uuid) -> NewStock {
        NewStock {
            pond_id,
            species_id,
            quantity: 1000,
            initial_avg_weight: Some(Decimal::from(50)),
            stocked_on: date(2024, 1, 1),
        }
    }

    fn open(pond_id: Uuid, species_id: Uuid, existing: &[PondFishStock]) -> FarmResult<PondFishStock> {
        new_stock(pond_id, species_id).open(Uuid::new_v4(), Uuid::new_v4(), date(2024, 6, 1), existing)
    }

    #[test]
    fn test_open_creates_active_stock() {
        let stock = open(Uuid::new_v4(), Uuid::new_v4(), &[]).unwrap();
        assert_eq!(stock.status, StockStatus::Active);
        assert_eq!(stock.closed_on, None);
        assert!(stock.check_invariants().is_ok());
    }

    #[test]
    fn test_open_rejects_second_active_stock() {
        let (pond, species) = (Uuid::new_v4(), Uuid::new_v4());
        let first = open(pond, species, &[]).unwrap();
        assert_eq!(open(pond, species, &[first]), Err(FarmError::DuplicateActiveStock));
    }

    #[test]
    fn test_open_allowed_after_close() {
        let (pond, species) = (Uuid::new_v4(), Uuid::new_v4());
        let first = open(pond, species, &[]).unwrap();
        let closed = first.close(date(2024, 5, 1)).unwrap();
        assert!(open(pond, species, &[closed]).is_ok());
    }

    #[test]
    fn test_open_other_species_same_pond() {
        let pond = Uuid::new_v4();
        let first = open(pond, Uuid::new_v4(), &[]).unwrap();
        assert!(open(pond, Uuid::new_v4(), &[first]).is_ok());
    }

    #[test]
    fn test_open_rejects_future_stocking() {
        let mut input = new_stock(Uuid::new_v4(), Uuid::new_v4());
        input.stocked_on = date(2030, 1, 1);
        let result = input.open(Uuid::new_v4(), Uuid::new_v4(), date(2024, 6, 1), &[]);
        assert!(matches!(result, Err(FarmError::InvalidDate { .. })));
    }

    #[test]
    fn test_close_sets_status_and_date() {
        let stock = open(Uuid::new_v4(), Uuid::new_v4(), &[]).unwrap();
        let closed = stock.close(date(2024, 4, 1)).unwrap();
        assert_eq!(closed.status, StockStatus::Closed);
        assert_eq!(closed.closed_on, Some(date(2024, 4, 1)));
        assert!(closed.check_invariants().is_ok());
        // original untouched
        assert!(stock.is_active());
    }

    #[test]
    fn test_close_twice_fails() {
        let stock = open(Uuid::new_v4(), Uuid::new_v4(), &[]).unwrap();
        let closed = stock.close(date(2024, 4, 1)).unwrap();
        assert_eq!(closed.close(date(2024, 5, 1)), Err(FarmError::AlreadyClosed));
        assert_eq!(closed.closed_on, Some(date(2024, 4, 1)));
    }

    #[test]
    fn test_close_before_stocking_fails() {
        let stock = open(Uuid::new_v4(), Uuid::new_v4(), &[]).unwrap();
        let err = stock.close(date(2023, 12, 31)).unwrap_err();
        assert_eq!(err.field(), Some("closed_on"));
    }

    #[test]
    fn test_close_on_stocking_day() {
        let stock = open(Uuid::new_v4(), Uuid::new_v4(), &[]).unwrap();
        assert!(stock.close(date(2024, 1, 1)).is_ok());
    }

    #[test]
    fn test_sampling_guards() {
        let stock = open(Uuid::new_v4(), Uuid::new_v4(), &[]).unwrap();
        assert!(stock.ensure_accepts_sampling(date(2024, 1, 1)).is_ok());
        assert!(matches!(
            stock.ensure_accepts_sampling(date(2023, 12, 1)),
            Err(FarmError::InvalidDate { .. })
        ));

        let closed = stock.close(date(2024, 3, 1)).unwrap();
        assert_eq!(
            closed.ensure_accepts_sampling(date(2024, 2, 1)),
            Err(FarmError::StockNotActive)
        );
    }

    #[test]
    fn test_invariant_violations_detected() {
        let mut stock = open(Uuid::new_v4(), Uuid::new_v4(), &[]).unwrap();
        stock.status = StockStatus::Closed;
        assert!(stock.check_invariants().is_err());

        stock.status = StockStatus::Active;
        stock.closed_on = Some(date(2024, 2, 1));
        assert!(stock.check_invariants().is_err());
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(StockStatus::from_str("ACTIVE"), Some(StockStatus::Active));
        assert_eq!(StockStatus::from_str("closed"), Some(StockStatus::Closed));
        assert_eq!(StockStatus::from_str("harvested"), None);
        assert_eq!(StockStatus::Closed.as_str(), "closed");
    }

    #[test]
    fn test_display_name() {
        let stock = open(Uuid::new_v4(), Uuid::new_v4(), &[]).unwrap();
        assert_eq!(stock.display_name("Tilapia", "North Pond"), "Tilapia in North Pond (ACTIVE)");
    }
}
