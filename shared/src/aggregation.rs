//! Batch aggregation for weight samplings
//!
//! Field staff weigh the sampled fish in batches. These routines turn the
//! raw batch weights into the sampling facts that get stored: fish count,
//! total weight and the rounded average weight. All arithmetic is done in
//! `Decimal`, never binary floating point.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{FarmError, FarmResult};
use crate::types::{round2, with_cents};
use crate::validation::{validate_batch_weight, validate_upper_bound, MAX_SAMPLE_TOTAL_WEIGHT};

/// Aggregated facts of one sampling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingAggregate {
    pub sample_fish_count: i64,
    /// Total weight in grams, exact sum of the batch weights
    pub sample_total_weight: Decimal,
    /// Average weight in grams, rounded to 2 places
    pub average_weight: Decimal,
}

/// A batch with its own fish count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub count: i64,
    pub weight: Decimal,
}

/// A batch weight as submitted by a client: a JSON number or a string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawWeight {
    Number(serde_json::Number),
    Text(String),
}

impl RawWeight {
    pub fn as_text(&self) -> String {
        match self {
            RawWeight::Number(n) => n.to_string(),
            RawWeight::Text(s) => s.clone(),
        }
    }
}

impl From<Decimal> for RawWeight {
    fn from(value: Decimal) -> Self {
        RawWeight::Text(value.to_string())
    }
}

/// Aggregate equally-sized batches.
///
/// `sample_fish_count = batch_size * batch_weights.len()`,
/// `sample_total_weight = sum(batch_weights)`,
/// `average_weight = round2(total / count)`.
pub fn aggregate(batch_size: i64, batch_weights: &[Decimal]) -> FarmResult<SamplingAggregate> {
    if batch_size <= 0 {
        return Err(FarmError::invalid_input(
            "batch_size",
            "Batch size must be greater than zero",
        ));
    }
    if batch_weights.is_empty() {
        return Err(FarmError::invalid_input(
            "batch_weights",
            "At least one batch must be provided",
        ));
    }

    let batches = batch_weights
        .iter()
        .enumerate()
        .map(|(idx, weight)| -> FarmResult<Batch> {
            validate_batch_weight(&format!("batch_weights[{}]", idx), *weight)?;
            Ok(Batch {
                count: batch_size,
                weight: *weight,
            })
        })
        .collect::<FarmResult<Vec<_>>>()?;

    sum_batches(&batches, "batch_weights")
}

/// Aggregate batches given as raw text, e.g. straight from a form.
pub fn aggregate_raw<S: AsRef<str>>(batch_size: i64, raw_weights: &[S]) -> FarmResult<SamplingAggregate> {
    if batch_size <= 0 {
        return Err(FarmError::invalid_input(
            "batch_size",
            "Batch size must be greater than zero",
        ));
    }

    let weights = raw_weights
        .iter()
        .enumerate()
        .map(|(idx, raw)| parse_weight(&format!("batch_weights[{}]", idx), raw.as_ref()))
        .collect::<FarmResult<Vec<_>>>()?;

    aggregate(batch_size, &weights)
}

/// Aggregate batches that each carry their own fish count
pub fn aggregate_batches(batches: &[Batch]) -> FarmResult<SamplingAggregate> {
    if batches.is_empty() {
        return Err(FarmError::invalid_input(
            "batches",
            "At least one batch must be provided",
        ));
    }

    for (idx, batch) in batches.iter().enumerate() {
        if batch.count <= 0 {
            return Err(FarmError::invalid_input(
                format!("batches[{}].count", idx),
                "Fish count must be greater than zero",
            ));
        }
        validate_batch_weight(&format!("batches[{}].weight", idx), batch.weight)?;
    }

    sum_batches(batches, "batches")
}

/// Parse one weight value in grams
pub fn parse_weight(field: &str, raw: &str) -> FarmResult<Decimal> {
    let trimmed = raw.trim();
    let weight = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| FarmError::invalid_input(field, format!("Invalid batch weight: {}", raw)))?;

    validate_batch_weight(field, weight)?;
    Ok(weight)
}

/// Parse a batch sheet with one `count:weight` pair per line (e.g. `5:420`).
///
/// Blank lines are skipped; line numbers in errors are 1-based.
pub fn parse_batch_sheet(sheet: &str) -> FarmResult<Vec<Batch>> {
    let mut batches = Vec::new();

    for (idx, line) in sheet.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (count, weight) = line.split_once(':').ok_or_else(|| {
            FarmError::invalid_input(
                "fish_batches",
                format!("Line {}: Use format count:weight (e.g. 5:420)", line_no),
            )
        })?;

        let count = count.trim().parse::<i64>().map_err(|_| {
            FarmError::invalid_input(
                "fish_batches",
                format!("Line {}: Fish count must be a number", line_no),
            )
        })?;
        if count <= 0 {
            return Err(FarmError::invalid_input(
                "fish_batches",
                format!("Line {}: Fish count must be greater than zero", line_no),
            ));
        }

        let weight = parse_weight("fish_batches", weight).map_err(|e| match e {
            FarmError::InvalidInput { message, .. } => {
                FarmError::invalid_input("fish_batches", format!("Line {}: {}", line_no, message))
            }
            other => other,
        })?;

        batches.push(Batch { count, weight });
    }

    if batches.is_empty() {
        return Err(FarmError::invalid_input(
            "fish_batches",
            "Please enter at least one batch",
        ));
    }

    Ok(batches)
}

// Counts and weights are already validated as positive.
fn sum_batches(batches: &[Batch], field: &str) -> FarmResult<SamplingAggregate> {
    let overflow = || FarmError::invalid_input(field, "Sampling totals are too large");

    let mut fish_count: i64 = 0;
    let mut total_weight = Decimal::ZERO;
    for batch in batches {
        fish_count = fish_count.checked_add(batch.count).ok_or_else(overflow)?;
        total_weight = total_weight.checked_add(batch.weight).ok_or_else(overflow)?;
    }
    validate_upper_bound(field, total_weight, MAX_SAMPLE_TOTAL_WEIGHT)?;

    let average = total_weight
        .checked_div(Decimal::from(fish_count))
        .ok_or_else(overflow)?;

    Ok(SamplingAggregate {
        sample_fish_count: fish_count,
        sample_total_weight: with_cents(total_weight),
        average_weight: round2(average),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_aggregate_reference_example() {
        let result = aggregate(5, &[dec("420"), dec("430"), dec("415")]).unwrap();
        assert_eq!(result.sample_fish_count, 15);
        assert_eq!(result.sample_total_weight, dec("1265.00"));
        assert_eq!(result.sample_total_weight.to_string(), "1265.00");
        assert_eq!(result.average_weight, dec("84.33"));
    }

    #[test]
    fn test_aggregate_exact_decimal_sum() {
        let weights = vec![dec("0.1"); 30];
        let result = aggregate(1, &weights).unwrap();
        assert_eq!(result.sample_total_weight, dec("3.0"));
        assert_eq!(result.average_weight, dec("0.10"));
    }

    #[test]
    fn test_aggregate_rounds_half_up() {
        // 100.5 / 20 = 5.025
        let result = aggregate(20, &[dec("100.5")]).unwrap();
        assert_eq!(result.average_weight, dec("5.03"));
    }

    #[test]
    fn test_aggregate_rejects_bad_batch_size() {
        for size in [0, -3] {
            let err = aggregate(size, &[dec("10")]).unwrap_err();
            assert_eq!(err.field(), Some("batch_size"));
        }
    }

    #[test]
    fn test_aggregate_rejects_empty() {
        let err = aggregate(5, &[]).unwrap_err();
        assert_eq!(err.field(), Some("batch_weights"));
    }

    #[test]
    fn test_aggregate_rejects_non_positive_weight() {
        let err = aggregate(5, &[dec("10"), dec("0")]).unwrap_err();
        assert_eq!(err.field(), Some("batch_weights[1]"));

        let err = aggregate(5, &[dec("-1")]).unwrap_err();
        assert_eq!(err.field(), Some("batch_weights[0]"));
    }

    #[test]
    fn test_aggregate_raw_parses_text() {
        let result = aggregate_raw(5, &["420", " 430.50 ", "415"]).unwrap();
        assert_eq!(result.sample_total_weight, dec("1265.50"));
    }

    #[test]
    fn test_aggregate_raw_rejects_garbage() {
        let err = aggregate_raw(5, &["420", "heavy"]).unwrap_err();
        assert_eq!(err.field(), Some("batch_weights[1]"));
        assert_eq!(err.code(), "INVALID_INPUT");
    }

    #[test]
    fn test_raw_weight_from_json() {
        let weights: Vec<RawWeight> = serde_json::from_str(r#"[420, "430.5", 415.25]"#).unwrap();
        let texts: Vec<String> = weights.iter().map(RawWeight::as_text).collect();
        let result = aggregate_raw(5, &texts).unwrap();
        assert_eq!(result.sample_total_weight, dec("1265.75"));
    }

    #[test]
    fn test_aggregate_batches_mixed_counts() {
        let batches = vec![
            Batch { count: 5, weight: dec("420") },
            Batch { count: 3, weight: dec("260") },
        ];
        let result = aggregate_batches(&batches).unwrap();
        assert_eq!(result.sample_fish_count, 8);
        assert_eq!(result.sample_total_weight, dec("680"));
        assert_eq!(result.average_weight, dec("85.00"));
    }

    #[test]
    fn test_aggregate_batches_rejects_zero_count() {
        let batches = vec![Batch { count: 0, weight: dec("420") }];
        let err = aggregate_batches(&batches).unwrap_err();
        assert_eq!(err.field(), Some("batches[0].count"));
    }

    #[test]
    fn test_weights_limited_to_two_decimals() {
        let err = aggregate_raw(5, &["420", "420.125"]).unwrap_err();
        assert_eq!(err.field(), Some("batch_weights[1]"));

        let err = aggregate(5, &[dec("420.125")]).unwrap_err();
        assert_eq!(err.field(), Some("batch_weights[0]"));

        let err = parse_batch_sheet("5:420\n5:420.125").unwrap_err();
        assert!(err.to_string().contains("Line 2"));
        assert!(err.to_string().contains("decimal places"));

        assert!(aggregate_raw(5, &["420.10"]).is_ok());
    }

    #[test]
    fn test_total_weight_storage_limit() {
        let at_limit = aggregate(1, &[dec("9999999999.99")]).unwrap();
        assert_eq!(at_limit.sample_total_weight, MAX_SAMPLE_TOTAL_WEIGHT);

        let err = aggregate(1, &[dec("9999999999.99"), dec("0.01")]).unwrap_err();
        assert_eq!(err.field(), Some("batch_weights"));

        let err = aggregate_raw(1, &["1e20"]).unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");

        let batches = vec![Batch { count: 2, weight: dec("10000000000") }];
        let err = aggregate_batches(&batches).unwrap_err();
        assert_eq!(err.field(), Some("batches"));
    }

    #[test]
    fn test_parse_batch_sheet() {
        let batches = parse_batch_sheet("5:420\n\n 5 : 430.5 \n").unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1], Batch { count: 5, weight: dec("430.5") });
    }

    #[test]
    fn test_parse_batch_sheet_errors_name_the_line() {
        let err = parse_batch_sheet("5:420\n5-430").unwrap_err();
        assert!(err.to_string().contains("Line 2"));

        let err = parse_batch_sheet("x:420").unwrap_err();
        assert!(err.to_string().contains("Fish count must be a number"));

        let err = parse_batch_sheet("5:0").unwrap_err();
        assert!(err.to_string().contains("Line 1"));

        assert!(parse_batch_sheet("   \n").is_err());
    }
}
