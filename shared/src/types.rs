//! Common types used across the platform

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Round to two decimal places, halves away from zero.
///
/// Every derived weight and percentage goes through this one routine so
/// results are reproducible regardless of where they are computed.
pub fn round2(value: Decimal) -> Decimal {
    with_cents(value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Pad a value to at least two decimal places without changing it
pub fn with_cents(mut value: Decimal) -> Decimal {
    if value.scale() < 2 {
        value.rescale(2);
    }
    value
}

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

impl Pagination {
    /// Clamp requested values into a usable window
    pub fn normalized(page: Option<u32>, per_page: Option<u32>, default: u32, max: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(default).clamp(1, max.max(1)),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl PaginationMeta {
    pub fn new(pagination: &Pagination, total_items: u64) -> Self {
        let per_page = u64::from(pagination.per_page.max(1));
        let total_pages = total_items.div_ceil(per_page);
        Self {
            page: pagination.page,
            per_page: pagination.per_page,
            total_items,
            total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
        }
    }
}

/// Date range for queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<chrono::NaiveDate>,
    pub end: Option<chrono::NaiveDate>,
}

impl DateRange {
    /// False only when both ends are set and the end precedes the start
    pub fn is_ordered(&self) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= end,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(dec("84.335")), dec("84.34"));
        assert_eq!(round2(dec("84.325")), dec("84.33"));
        assert_eq!(round2(dec("-3.125")), dec("-3.13"));
        assert_eq!(round2(dec("84.3333333")), dec("84.33"));
    }

    #[test]
    fn test_round2_keeps_two_places() {
        assert_eq!(round2(dec("1265")).to_string(), "1265.00");
        assert_eq!(with_cents(dec("10.5")).to_string(), "10.50");
        assert_eq!(with_cents(dec("10.125")).to_string(), "10.125");
    }

    #[test]
    fn test_pagination_meta() {
        let page = Pagination::normalized(Some(2), Some(10), 10, 100);
        assert_eq!(page.offset(), 10);
        let meta = PaginationMeta::new(&page, 21);
        assert_eq!(meta.total_pages, 3);

        let empty = PaginationMeta::new(&Pagination::default(), 0);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn test_date_range() {
        let d = |day| chrono::NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        let range = DateRange { start: Some(d(5)), end: Some(d(10)) };
        assert!(range.is_ordered());

        let open = DateRange { start: None, end: Some(d(1)) };
        assert!(open.is_ordered());
        assert!(!DateRange { start: Some(d(10)), end: Some(d(5)) }.is_ordered());
    }

    #[test]
    fn test_pagination_clamps() {
        let page = Pagination::normalized(Some(0), Some(500), 10, 100);
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, 100);
    }
}
