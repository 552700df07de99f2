//! Growth evaluation for samplings and stocks
//!
//! Growth is always derived, never stored. Two distinct metrics exist:
//!
//! - per-sampling growth compares a sampling against its baseline: the
//!   immediately preceding sampling of the same stock or, for the first
//!   sampling, the stock's initial average weight. Classified with
//!   [`per_sampling_status`] (GOOD ≥ 8%, AVERAGE ≥ 4%, POOR below).
//! - cumulative growth compares the latest sampling against the stocking
//!   record. Classified with [`cumulative_status`] (EXCELLENT ≥ 25%,
//!   GOOD ≥ 15%, AVERAGE ≥ 8%, POOR below).
//!
//! A zero or missing baseline yields no percentage and a NO DATA status
//! rather than an error.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{FarmError, FarmResult};
use crate::models::{FishSampling, PondFishStock};
use crate::types::round2;

// ============================================================================
// Classifications
// ============================================================================

/// Status of growth over a single sampling interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SamplingGrowthStatus {
    #[serde(rename = "GOOD")]
    Good,
    #[serde(rename = "AVERAGE")]
    Average,
    #[serde(rename = "POOR")]
    Poor,
    #[serde(rename = "NO DATA")]
    NoData,
}

impl SamplingGrowthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SamplingGrowthStatus::Good => "GOOD",
            SamplingGrowthStatus::Average => "AVERAGE",
            SamplingGrowthStatus::Poor => "POOR",
            SamplingGrowthStatus::NoData => "NO DATA",
        }
    }
}

impl std::fmt::Display for SamplingGrowthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of growth accumulated since stocking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CumulativeGrowthStatus {
    #[serde(rename = "EXCELLENT")]
    Excellent,
    #[serde(rename = "GOOD")]
    Good,
    #[serde(rename = "AVERAGE")]
    Average,
    #[serde(rename = "POOR")]
    Poor,
    #[serde(rename = "NO DATA")]
    NoData,
}

impl CumulativeGrowthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CumulativeGrowthStatus::Excellent => "EXCELLENT",
            CumulativeGrowthStatus::Good => "GOOD",
            CumulativeGrowthStatus::Average => "AVERAGE",
            CumulativeGrowthStatus::Poor => "POOR",
            CumulativeGrowthStatus::NoData => "NO DATA",
        }
    }
}

impl std::fmt::Display for CumulativeGrowthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify per-sampling growth percentage
pub fn per_sampling_status(growth_percentage: Option<Decimal>) -> SamplingGrowthStatus {
    match growth_percentage {
        None => SamplingGrowthStatus::NoData,
        Some(p) if p >= Decimal::from(8) => SamplingGrowthStatus::Good,
        Some(p) if p >= Decimal::from(4) => SamplingGrowthStatus::Average,
        Some(_) => SamplingGrowthStatus::Poor,
    }
}

/// Classify cumulative growth percentage since stocking
pub fn cumulative_status(growth_percentage: Option<Decimal>) -> CumulativeGrowthStatus {
    match growth_percentage {
        None => CumulativeGrowthStatus::NoData,
        Some(p) if p >= Decimal::from(25) => CumulativeGrowthStatus::Excellent,
        Some(p) if p >= Decimal::from(15) => CumulativeGrowthStatus::Good,
        Some(p) if p >= Decimal::from(8) => CumulativeGrowthStatus::Average,
        Some(_) => CumulativeGrowthStatus::Poor,
    }
}

// ============================================================================
// Baselines
// ============================================================================

/// Where a baseline weight came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineSource {
    PreviousSampling,
    InitialStock,
}

/// Reference weight a sampling is compared against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    pub source: BaselineSource,
    pub average_weight: Decimal,
    /// Sampling date, or the stocking date for the initial record
    pub observed_on: NaiveDate,
}

/// An average weight observed on a date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightPoint {
    pub average_weight: Decimal,
    pub observed_on: NaiveDate,
}

/// Most recent sampling of the same stock strictly earlier than `current`.
///
/// Input order does not matter. Samplings without a usable average are
/// skipped; equal dates (rejected at creation) fall back to id order.
pub fn previous_sampling<'a>(
    current: &FishSampling,
    samplings: &'a [FishSampling],
) -> Option<&'a FishSampling> {
    samplings
        .iter()
        .filter(|s| s.fish_stock_id == current.fish_stock_id && s.sampled_on < current.sampled_on)
        .filter(|s| s.average_weight().is_some())
        .max_by_key(|s| (s.sampled_on, s.id))
}

/// Resolve the baseline for `current`: the previous sampling if any,
/// otherwise the stock's initial average weight, otherwise nothing.
pub fn select_baseline(
    current: &FishSampling,
    stock: &PondFishStock,
    samplings: &[FishSampling],
) -> Option<Baseline> {
    if let Some(previous) = previous_sampling(current, samplings) {
        if let Some(average_weight) = previous.average_weight() {
            return Some(Baseline {
                source: BaselineSource::PreviousSampling,
                average_weight,
                observed_on: previous.sampled_on,
            });
        }
    }

    stock.initial_avg_weight.map(|average_weight| Baseline {
        source: BaselineSource::InitialStock,
        average_weight,
        observed_on: stock.stocked_on,
    })
}

// ============================================================================
// Evaluation
// ============================================================================

/// `round2(growth / baseline * 100)`; undefined for a zero baseline
pub fn growth_percentage(growth: Decimal, baseline_weight: Decimal) -> FarmResult<Decimal> {
    if baseline_weight.is_zero() {
        return Err(FarmError::DivisionUndefined);
    }
    growth
        .checked_div(baseline_weight)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(round2)
        .ok_or(FarmError::DivisionUndefined)
}

/// Growth of one observation against a resolved baseline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthEvaluation {
    pub growth_from_previous: Option<Decimal>,
    pub growth_percentage: Option<Decimal>,
    pub per_sampling_status: SamplingGrowthStatus,
    pub days_elapsed: Option<i64>,
    pub baseline_source: Option<BaselineSource>,
}

impl GrowthEvaluation {
    fn no_data() -> Self {
        Self {
            growth_from_previous: None,
            growth_percentage: None,
            per_sampling_status: SamplingGrowthStatus::NoData,
            days_elapsed: None,
            baseline_source: None,
        }
    }
}

/// Evaluate growth of `current` against `baseline`
pub fn evaluate(current: &WeightPoint, baseline: Option<&Baseline>) -> GrowthEvaluation {
    let Some(baseline) = baseline else {
        return GrowthEvaluation::no_data();
    };

    let growth = round2(current.average_weight - baseline.average_weight);
    // Zero baseline degrades to NO DATA instead of failing the read.
    let percentage = growth_percentage(growth, baseline.average_weight).ok();

    GrowthEvaluation {
        growth_from_previous: Some(growth),
        growth_percentage: percentage,
        per_sampling_status: per_sampling_status(percentage),
        days_elapsed: Some((current.observed_on - baseline.observed_on).num_days()),
        baseline_source: Some(baseline.source),
    }
}

/// Derived read bundle of one sampling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingGrowth {
    pub average_weight: Option<Decimal>,
    pub growth_from_previous: Option<Decimal>,
    pub growth_percentage: Option<Decimal>,
    pub growth_status: SamplingGrowthStatus,
    pub days_since_previous: Option<i64>,
    pub baseline_source: Option<BaselineSource>,
}

/// Compute the growth bundle of `current` given its stock and the stock's
/// samplings (which may include `current` itself and later samplings).
pub fn sampling_growth(
    current: &FishSampling,
    stock: &PondFishStock,
    samplings: &[FishSampling],
) -> SamplingGrowth {
    let average_weight = current.average_weight();

    let evaluation = match average_weight {
        Some(average_weight) => {
            let point = WeightPoint {
                average_weight,
                observed_on: current.sampled_on,
            };
            let baseline = select_baseline(current, stock, samplings);
            evaluate(&point, baseline.as_ref())
        }
        None => GrowthEvaluation::no_data(),
    };

    SamplingGrowth {
        average_weight,
        growth_from_previous: evaluation.growth_from_previous,
        growth_percentage: evaluation.growth_percentage,
        growth_status: evaluation.per_sampling_status,
        days_since_previous: evaluation.days_elapsed,
        baseline_source: evaluation.baseline_source,
    }
}

/// Growth of a stock since stocking, measured at its latest sampling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CumulativeGrowth {
    pub latest_sampled_on: Option<NaiveDate>,
    pub latest_average_weight: Option<Decimal>,
    pub total_growth: Option<Decimal>,
    pub total_growth_percentage: Option<Decimal>,
    pub days_since_stocking: Option<i64>,
    pub cumulative_status: CumulativeGrowthStatus,
}

/// Compute cumulative growth of `stock` from its samplings
pub fn cumulative_growth(stock: &PondFishStock, samplings: &[FishSampling]) -> CumulativeGrowth {
    let latest = samplings
        .iter()
        .filter(|s| s.fish_stock_id == stock.id)
        .max_by_key(|s| (s.sampled_on, s.id));

    let latest_average_weight = latest.and_then(FishSampling::average_weight);

    let total_growth = match (latest_average_weight, stock.initial_avg_weight) {
        (Some(latest), Some(initial)) => Some(round2(latest - initial)),
        _ => None,
    };

    let total_growth_percentage = match (total_growth, stock.initial_avg_weight) {
        (Some(growth), Some(initial)) => growth_percentage(growth, initial).ok(),
        _ => None,
    };

    CumulativeGrowth {
        latest_sampled_on: latest.map(|s| s.sampled_on),
        latest_average_weight,
        total_growth,
        total_growth_percentage,
        days_since_stocking: latest.map(|s| (s.sampled_on - stock.stocked_on).num_days()),
        cumulative_status: cumulative_status(total_growth_percentage),
    }
}
