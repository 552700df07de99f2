//! Validation utilities for aquafarm records
//!
//! Shape checks shared by the server and the browser client. Each check
//! attributes its failure to the input field it inspects.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{FarmError, FarmResult};

/// Longest pond or species name accepted
pub const MAX_NAME_LENGTH: usize = 50;

/// Decimal places kept by storage for weights and areas
pub const STORED_DECIMAL_PLACES: u32 = 2;

/// Largest pond area or initial average weight storage holds, 99999999.99
pub const MAX_STORED_MEASURE: Decimal = Decimal::from_parts(0x540B_E3FF, 2, 0, false, 2);

/// Largest sample total weight storage holds, 9999999999.99
pub const MAX_SAMPLE_TOTAL_WEIGHT: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

// ============================================================================
// Names
// ============================================================================

/// Validate a pond or species name (trimmed, non-empty, bounded length)
pub fn validate_name(field: &str, name: &str) -> FarmResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(FarmError::invalid_input(field, "Name cannot be empty"));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(FarmError::invalid_input(
            field,
            format!("Name must be at most {} characters", MAX_NAME_LENGTH),
        ));
    }
    Ok(())
}

// ============================================================================
// Quantities
// ============================================================================

/// Validate pond area in acres
pub fn validate_area_acres(area: Decimal) -> FarmResult<()> {
    if area <= Decimal::ZERO {
        return Err(FarmError::invalid_input(
            "area_acres",
            "Area must be greater than zero",
        ));
    }
    validate_upper_bound("area_acres", area, MAX_STORED_MEASURE)?;
    validate_decimal_places("area_acres", area)
}

/// Validate the number of fish stocked
pub fn validate_quantity(quantity: i32) -> FarmResult<()> {
    if quantity <= 0 {
        return Err(FarmError::invalid_input(
            "quantity",
            "Quantity must be greater than zero",
        ));
    }
    Ok(())
}

/// Validate the initial average weight recorded at stocking (grams).
///
/// Zero is accepted; growth percentages against it report no data.
pub fn validate_initial_avg_weight(weight: Decimal) -> FarmResult<()> {
    if weight < Decimal::ZERO {
        return Err(FarmError::invalid_input(
            "initial_avg_weight",
            "Initial average weight cannot be negative",
        ));
    }
    validate_upper_bound("initial_avg_weight", weight, MAX_STORED_MEASURE)?;
    validate_decimal_places("initial_avg_weight", weight)
}

/// Validate one sampled batch weight (grams): positive, storable precision
pub fn validate_batch_weight(field: &str, weight: Decimal) -> FarmResult<()> {
    if weight <= Decimal::ZERO {
        return Err(FarmError::invalid_input(
            field,
            "Batch weight must be greater than zero",
        ));
    }
    validate_decimal_places(field, weight)
}

/// Reject values larger than storage holds
pub fn validate_upper_bound(field: &str, value: Decimal, max: Decimal) -> FarmResult<()> {
    if value > max {
        return Err(FarmError::invalid_input(
            field,
            format!("Value cannot exceed {}", max),
        ));
    }
    Ok(())
}

/// Reject values storage would silently round
pub fn validate_decimal_places(field: &str, value: Decimal) -> FarmResult<()> {
    if value.normalize().scale() > STORED_DECIMAL_PLACES {
        return Err(FarmError::invalid_input(
            field,
            format!("At most {} decimal places are allowed", STORED_DECIMAL_PLACES),
        ));
    }
    Ok(())
}

// ============================================================================
// Dates
// ============================================================================

/// Validate a field-entered date is not in the future
pub fn validate_not_future(field: &str, date: NaiveDate, today: NaiveDate) -> FarmResult<()> {
    if date > today {
        return Err(FarmError::invalid_date(field, "Date cannot be in the future"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "North Pond").is_ok());
        assert!(validate_name("name", "   ").is_err());
        assert!(validate_name("name", &"x".repeat(51)).is_err());
        assert!(validate_name("name", &"x".repeat(50)).is_ok());
    }

    #[test]
    fn test_validate_area() {
        assert!(validate_area_acres(dec("1.25")).is_ok());
        assert!(validate_area_acres(dec("0")).is_err());
        assert!(validate_area_acres(dec("-2")).is_err());
        assert!(validate_area_acres(dec("1.255")).is_err());
        // trailing zeros do not count
        assert!(validate_area_acres(dec("1.2500")).is_ok());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-10).is_err());
    }

    #[test]
    fn test_validate_initial_avg_weight() {
        assert!(validate_initial_avg_weight(dec("50.00")).is_ok());
        assert!(validate_initial_avg_weight(Decimal::ZERO).is_ok());
        assert!(validate_initial_avg_weight(dec("-0.01")).is_err());
    }

    #[test]
    fn test_storage_bounds() {
        assert_eq!(MAX_STORED_MEASURE.to_string(), "99999999.99");
        assert_eq!(MAX_SAMPLE_TOTAL_WEIGHT.to_string(), "9999999999.99");

        assert!(validate_area_acres(dec("99999999.99")).is_ok());
        let err = validate_area_acres(dec("100000000.00")).unwrap_err();
        assert_eq!(err.field(), Some("area_acres"));

        assert!(validate_initial_avg_weight(dec("99999999.99")).is_ok());
        let err = validate_initial_avg_weight(dec("100000000")).unwrap_err();
        assert_eq!(err.field(), Some("initial_avg_weight"));
    }

    #[test]
    fn test_validate_batch_weight() {
        assert!(validate_batch_weight("batch_weights[0]", dec("420.50")).is_ok());
        assert!(validate_batch_weight("batch_weights[0]", dec("420.5000")).is_ok());
        assert!(validate_batch_weight("batch_weights[0]", Decimal::ZERO).is_err());

        let err = validate_batch_weight("batch_weights[2]", dec("420.125")).unwrap_err();
        assert_eq!(err.field(), Some("batch_weights[2]"));
        assert_eq!(err.code(), "INVALID_INPUT");
    }

    #[test]
    fn test_validate_not_future() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert!(validate_not_future("sampled_on", today, today).is_ok());
        let err = validate_not_future("sampled_on", today.succ_opt().unwrap(), today).unwrap_err();
        assert_eq!(err.field(), Some("sampled_on"));
    }
}
