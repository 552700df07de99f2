//! WebAssembly module for the aquafarm tracker
//!
//! Provides client-side computation for:
//! - Sampling previews from batch weights
//! - Growth status classification
//! - Offline validation of a sampling before upload

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::aggregation::*;
pub use shared::growth::*;
pub use shared::models::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::debug_1(&JsValue::from_str("aquafarm wasm loaded"));
}

/// Aggregate equally sized batches.
///
/// `weights_json` is a JSON array of numbers or numeric strings. Returns the
/// aggregate as JSON.
#[wasm_bindgen]
pub fn preview_sampling(batch_size: i32, weights_json: &str) -> Result<String, JsValue> {
    preview_json(i64::from(batch_size), weights_json).map_err(|e| JsValue::from_str(&e))
}

/// Same as [`preview_sampling`] but takes a JS array straight from a form
#[wasm_bindgen]
pub fn preview_sampling_array(batch_size: i32, weights: js_sys::Array) -> Result<String, JsValue> {
    let raw: Vec<String> = weights
        .iter()
        .map(|value| {
            value
                .as_string()
                .or_else(|| value.as_f64().map(|n| n.to_string()))
                .unwrap_or_default()
        })
        .collect();

    aggregate_raw(i64::from(batch_size), &raw)
        .map_err(|e| e.to_string())
        .and_then(to_json)
        .map_err(|e| JsValue::from_str(&e))
}

/// Aggregate a `count:weight` batch sheet, one batch per line
#[wasm_bindgen]
pub fn preview_batch_sheet(sheet: &str) -> Result<String, JsValue> {
    sheet_json(sheet).map_err(|e| JsValue::from_str(&e))
}

/// Per-sampling status of a growth percentage ("" means no data)
#[wasm_bindgen]
pub fn classify_sampling_growth(growth_percentage: &str) -> String {
    per_sampling_status(parse_percentage(growth_percentage)).to_string()
}

/// Cumulative status of growth since stocking ("" means no data)
#[wasm_bindgen]
pub fn classify_cumulative_growth(growth_percentage: &str) -> String {
    cumulative_status(parse_percentage(growth_percentage)).to_string()
}

/// Growth bundle of a sampling from `{sampling, stock, samplings}` JSON
#[wasm_bindgen]
pub fn evaluate_sampling_growth(input_json: &str) -> Result<String, JsValue> {
    growth_json(input_json).map_err(|e| JsValue::from_str(&e))
}

/// Check a sampling request offline from `{request, stock, samplings, today}`
/// JSON. Returns the aggregate, or the error with its field.
#[wasm_bindgen]
pub fn validate_sampling(input_json: &str) -> Result<String, JsValue> {
    validate_json(input_json).map_err(|e| JsValue::from_str(&e))
}

#[derive(Deserialize)]
struct GrowthInput {
    sampling: FishSampling,
    stock: PondFishStock,
    #[serde(default)]
    samplings: Vec<FishSampling>,
}

#[derive(Deserialize)]
struct ValidateInput {
    request: SamplingRequest,
    stock: PondFishStock,
    #[serde(default)]
    samplings: Vec<FishSampling>,
    today: NaiveDate,
}

fn preview_json(batch_size: i64, weights_json: &str) -> Result<String, String> {
    let weights: Vec<RawWeight> = serde_json::from_str(weights_json)
        .map_err(|e| format!("Invalid weights JSON: {}", e))?;
    let raw: Vec<String> = weights.iter().map(RawWeight::as_text).collect();

    let aggregate = aggregate_raw(batch_size, &raw).map_err(|e| e.to_string())?;
    to_json(aggregate)
}

fn sheet_json(sheet: &str) -> Result<String, String> {
    let batches = parse_batch_sheet(sheet).map_err(|e| e.to_string())?;
    let aggregate = aggregate_batches(&batches).map_err(|e| e.to_string())?;
    to_json(aggregate)
}

fn growth_json(input_json: &str) -> Result<String, String> {
    let input: GrowthInput =
        serde_json::from_str(input_json).map_err(|e| format!("Invalid input JSON: {}", e))?;
    to_json(sampling_growth(&input.sampling, &input.stock, &input.samplings))
}

fn validate_json(input_json: &str) -> Result<String, String> {
    let input: ValidateInput =
        serde_json::from_str(input_json).map_err(|e| format!("Invalid input JSON: {}", e))?;

    match input.request.prepare(&input.stock, &input.samplings, input.today) {
        Ok(aggregate) => to_json(aggregate),
        Err(e) => Err(serde_json::json!({
            "code": e.code(),
            "field": e.field(),
            "message": e.to_string(),
        })
        .to_string()),
    }
}

fn parse_percentage(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed).ok()
}

fn to_json<T: serde::Serialize>(value: T) -> Result<String, String> {
    serde_json::to_string(&value).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_json() {
        let json = preview_json(5, r#"[420, "430", 415]"#).unwrap();
        let aggregate: SamplingAggregate = serde_json::from_str(&json).unwrap();
        assert_eq!(aggregate.sample_fish_count, 15);
        assert_eq!(aggregate.average_weight, Decimal::from_str("84.33").unwrap());
    }

    #[test]
    fn test_preview_json_errors() {
        assert!(preview_json(0, "[420]").unwrap_err().contains("batch_size"));
        assert!(preview_json(5, "[]").unwrap_err().contains("batch_weights"));
        assert!(preview_json(5, "not json").unwrap_err().contains("Invalid weights JSON"));
    }

    #[test]
    fn test_sheet_json() {
        let json = sheet_json("5:420\n3:260").unwrap();
        let aggregate: SamplingAggregate = serde_json::from_str(&json).unwrap();
        assert_eq!(aggregate.sample_fish_count, 8);
    }

    #[test]
    fn test_classification() {
        assert_eq!(classify_sampling_growth("20.00"), "GOOD");
        assert_eq!(classify_sampling_growth("5"), "AVERAGE");
        assert_eq!(classify_sampling_growth(""), "NO DATA");
        assert_eq!(classify_cumulative_growth("30"), "EXCELLENT");
        assert_eq!(classify_cumulative_growth("abc"), "NO DATA");
    }

    #[test]
    fn test_growth_json() {
        let input = r#"{
            "sampling": {
                "id": "00000000-0000-0000-0000-000000000002",
                "user_id": "00000000-0000-0000-0000-000000000009",
                "fish_stock_id": "00000000-0000-0000-0000-000000000001",
                "sampled_on": "2024-02-01",
                "sample_fish_count": 10,
                "sample_total_weight": "600.00"
            },
            "stock": {
                "id": "00000000-0000-0000-0000-000000000001",
                "user_id": "00000000-0000-0000-0000-000000000009",
                "pond_id": "00000000-0000-0000-0000-000000000003",
                "species_id": "00000000-0000-0000-0000-000000000004",
                "quantity": 1000,
                "initial_avg_weight": "50.00",
                "stocked_on": "2024-01-01",
                "status": "ACTIVE",
                "closed_on": null
            }
        }"#;

        let json = growth_json(input).unwrap();
        let growth: SamplingGrowth = serde_json::from_str(&json).unwrap();
        assert_eq!(growth.growth_percentage, Some(Decimal::from_str("20.00").unwrap()));
        assert_eq!(growth.growth_status, SamplingGrowthStatus::Good);
    }

    fn validate_input(weights: &str) -> String {
        format!(
            r#"{{
                "request": {{
                    "fish_stock_id": "00000000-0000-0000-0000-000000000001",
                    "sampled_on": "2024-02-01",
                    "batch_size": 5,
                    "batch_weights": {weights}
                }},
                "stock": {{
                    "id": "00000000-0000-0000-0000-000000000001",
                    "user_id": "00000000-0000-0000-0000-000000000009",
                    "pond_id": "00000000-0000-0000-0000-000000000003",
                    "species_id": "00000000-0000-0000-0000-000000000004",
                    "quantity": 1000,
                    "initial_avg_weight": null,
                    "stocked_on": "2024-01-01",
                    "status": "ACTIVE",
                    "closed_on": null
                }},
                "today": "2024-06-01"
            }}"#
        )
    }

    #[test]
    fn test_validate_json_reports_field() {
        let err = validate_json(&validate_input(r#"[420, "oops"]"#)).unwrap_err();
        let detail: serde_json::Value = serde_json::from_str(&err).unwrap();
        assert_eq!(detail["code"], "INVALID_INPUT");
        assert_eq!(detail["field"], "batch_weights[1]");
    }

    #[test]
    fn test_validate_json_matches_server_precision() {
        let err = validate_json(&validate_input(r#"["420.125"]"#)).unwrap_err();
        let detail: serde_json::Value = serde_json::from_str(&err).unwrap();
        assert_eq!(detail["field"], "batch_weights[0]");

        let ok = validate_json(&validate_input(r#"["420.12", 430]"#)).unwrap();
        let aggregate: SamplingAggregate = serde_json::from_str(&ok).unwrap();
        assert_eq!(aggregate.sample_fish_count, 10);
    }
}
