//! Prediction Route

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::{ApiError, AppState};
use feature_engine::{DerivedFeatureRow, RawSpecification, UNKNOWN};

/// Response for the predict endpoint
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    /// Formatted unit price, e.g. "12,345.67"
    pub predicted_price: String,
    pub input_summary: InputSummary,
}

/// Structured echo of the specification the price was computed from
#[derive(Debug, Serialize)]
pub struct InputSummary {
    pub basic_info: BasicInfo,
    pub performance: Performance,
    pub materials: Materials,
}

#[derive(Debug, Serialize)]
pub struct BasicInfo {
    pub dimensions: String,
    pub specification: String,
    pub outlet_direction: String,
}

#[derive(Debug, Serialize)]
pub struct Performance {
    pub horsepower: String,
    pub airflow: String,
    pub static_pressure: String,
}

#[derive(Debug, Serialize)]
pub struct Materials {
    pub casing_material: String,
    pub frame_material: String,
}

/// Predict a unit price from a raw specification.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<PredictResponse>, ApiError> {
    let raw = RawSpecification::from_value(body)?;
    let row = state.deriver.derive(&raw);
    debug!(?row, "derived feature row");

    let prediction = state.model.predict_one(&row).await?;

    Ok(Json(PredictResponse {
        predicted_price: format_price(prediction.unit_price),
        input_summary: summarize(&row),
    }))
}

fn summarize(row: &DerivedFeatureRow) -> InputSummary {
    let text = |field: &Option<String>| field.clone().unwrap_or_else(|| UNKNOWN.to_string());

    InputSummary {
        basic_info: BasicInfo {
            dimensions: format!("{}x{}x{} mm", row.length, row.width, row.height),
            specification: text(&row.specification),
            outlet_direction: text(&row.outlet_direction),
        },
        performance: Performance {
            horsepower: format!("{} HP", row.horsepower_hp),
            airflow: format!("{} NCMM", row.airflow_ncmm),
            static_pressure: format!("{} mmAq", row.static_pressure_mmaq),
        },
        materials: Materials {
            casing_material: text(&row.casing_material),
            frame_material: text(&row.frame_material),
        },
    }
}

/// Format a price with thousands separators and two decimals.
fn format_price(price: f64) -> String {
    let formatted = format!("{:.2}", price.abs());
    let (integer, decimals) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::new();
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if price < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{decimals}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use feature_engine::FeatureDeriver;
    use serde_json::json;

    #[test]
    fn test_price_formatting() {
        assert_eq!(format_price(0.0), "0.00");
        assert_eq!(format_price(999.5), "999.50");
        assert_eq!(format_price(12345.678), "12,345.68");
        assert_eq!(format_price(1_234_567.5), "1,234,567.50");
        assert_eq!(format_price(-4200.0), "-4,200.00");
    }

    #[test]
    fn test_summary_reports_derived_row() {
        let deriver = FeatureDeriver::new();
        let row = deriver.derive(
            &RawSpecification::from_value(json!({
                "length": 100.0,
                "width": 50.0,
                "height": 20.0,
                "horsepower_hp": 10.0,
                "model": "FX-200",
                "casing_material": "SUS304",
            }))
            .unwrap(),
        );

        let summary = summarize(&row);
        assert_eq!(summary.basic_info.dimensions, "100x50x20 mm");
        // model aliases into specification before the summary is built
        assert_eq!(summary.basic_info.specification, "FX-200");
        assert_eq!(summary.basic_info.outlet_direction, UNKNOWN);
        assert_eq!(summary.performance.horsepower, "10 HP");
        assert_eq!(summary.materials.casing_material, "SUS304");
        assert_eq!(summary.materials.frame_material, UNKNOWN);
    }
}
