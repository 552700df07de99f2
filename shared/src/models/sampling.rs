//! Fish sampling models
//!
//! A sampling stores only the raw facts (fish count and total weight).
//! Average weight and every growth figure are derived on read.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PondFishStock;
use crate::aggregation::{aggregate_raw, RawWeight, SamplingAggregate};
use crate::error::{FarmError, FarmResult};
use crate::types::round2;
use crate::validation::validate_not_future;

/// One weight-sampling event of a stock
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FishSampling {
    pub id: Uuid,
    pub user_id: Uuid,
    pub fish_stock_id: Uuid,
    pub sampled_on: NaiveDate,
    pub sample_fish_count: i32,
    /// Total weight of the sampled fish in grams
    pub sample_total_weight: Decimal,
}

impl FishSampling {
    /// Build a sampling record from aggregated batch data
    pub fn from_aggregate(
        id: Uuid,
        user_id: Uuid,
        fish_stock_id: Uuid,
        sampled_on: NaiveDate,
        aggregate: &SamplingAggregate,
    ) -> FarmResult<Self> {
        let sample_fish_count = i32::try_from(aggregate.sample_fish_count).map_err(|_| {
            FarmError::invalid_input("batch_size", "Too many fish in one sampling")
        })?;

        Ok(Self {
            id,
            user_id,
            fish_stock_id,
            sampled_on,
            sample_fish_count,
            sample_total_weight: aggregate.sample_total_weight,
        })
    }

    /// Average weight in grams, rounded to 2 places.
    ///
    /// `None` only for records that violate the positive-count invariant.
    pub fn average_weight(&self) -> Option<Decimal> {
        if self.sample_fish_count <= 0 || self.sample_total_weight <= Decimal::ZERO {
            return None;
        }
        self.sample_total_weight
            .checked_div(Decimal::from(self.sample_fish_count))
            .map(round2)
    }
}

/// Creation request as supplied by a client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingRequest {
    pub fish_stock_id: Uuid,
    pub sampled_on: NaiveDate,
    pub batch_size: i64,
    pub batch_weights: Vec<RawWeight>,
}

impl SamplingRequest {
    /// Validate the request against its stock and the stock's existing
    /// samplings, then aggregate the batches.
    ///
    /// Nothing is written; the caller persists the result.
    pub fn prepare(
        &self,
        stock: &PondFishStock,
        existing: &[FishSampling],
        today: NaiveDate,
    ) -> FarmResult<SamplingAggregate> {
        ensure_can_record(stock, existing, self.sampled_on, today)?;

        let raw: Vec<String> = self.batch_weights.iter().map(RawWeight::as_text).collect();
        aggregate_raw(self.batch_size, &raw)
    }
}

/// Check that a new sampling on `sampled_on` may be recorded for `stock`.
///
/// Order: stock must be ACTIVE, date within `stocked_on..=today`, and no
/// other sampling of the stock on that date.
pub fn ensure_can_record(
    stock: &PondFishStock,
    existing: &[FishSampling],
    sampled_on: NaiveDate,
    today: NaiveDate,
) -> FarmResult<()> {
    stock.ensure_accepts_sampling(sampled_on)?;
    validate_not_future("sampled_on", sampled_on, today)?;

    let duplicate = existing
        .iter()
        .any(|s| s.fish_stock_id == stock.id && s.sampled_on == sampled_on);
    if duplicate {
        return Err(FarmError::DuplicateSamplingDate(sampled_on));
    }
    Ok(())
}
