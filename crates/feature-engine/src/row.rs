//! Specification Row Schema

use serde::Serialize;
use serde_json::{Map, Value};

use crate::DeriveError;

/// Numeric feature columns, in schema order.
pub const NUMERIC_FIELDS: [&str; 9] = [
    "length",
    "width",
    "height",
    "static_pressure_mmaq",
    "horsepower_hp",
    "airflow_ncmm",
    "operating_temperature_c",
    "purchase_quantity",
    "impeller_diameter_mm",
];

/// Dimension columns. Missing values fill with 0 instead of the batch median.
pub const DIMENSION_FIELDS: [&str; 3] = ["length", "width", "height"];

/// Columns computed from other fields, never taken from the caller.
pub const DERIVED_FIELDS: [&str; 6] = [
    "volume",
    "power_density",
    "airflow_efficiency",
    "pressure_efficiency",
    "length_width_ratio",
    "height_width_ratio",
];

/// Categorical feature columns.
pub const CATEGORICAL_FIELDS: [&str; 10] = [
    "series",
    "model",
    "outlet_direction",
    "casing_material",
    "frame_material",
    "product_name",
    "drive_method",
    "fire_spark_level",
    "single_double_suction",
    "fan_grade",
];

/// Placeholder for a categorical value the caller left blank.
pub const UNKNOWN: &str = "unknown";

/// A raw specification as submitted by a caller.
///
/// Values may be scalars or single-element lists; lists are unwrapped to
/// their first element at construction time.
#[derive(Debug, Clone, Default)]
pub struct RawSpecification {
    fields: Map<String, Value>,
}

impl RawSpecification {
    /// Build a specification from a request body.
    ///
    /// Fails when the body is not a JSON object; every other shape problem
    /// is absorbed later, field by field.
    pub fn from_value(value: Value) -> Result<Self, DeriveError> {
        let Value::Object(map) = value else {
            return Err(DeriveError::NotAMapping);
        };
        let fields = map
            .into_iter()
            .map(|(key, value)| (key, unwrap_scalar(value)))
            .collect();
        Ok(Self { fields })
    }

    /// Whether the caller supplied this field at all (even as null).
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Numeric view of a field. Unparseable and non-finite values read as `None`.
    pub fn number(&self, field: &str) -> Option<f64> {
        coerce_number(self.fields.get(field)?)
    }

    /// Text view of a field. Null and blank values read as `None`.
    pub fn text(&self, field: &str) -> Option<String> {
        coerce_text(self.fields.get(field)?)
    }

    /// Fields that are not part of the model schema.
    pub fn unknown_fields(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .filter(|(key, _)| !is_schema_field(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

fn is_schema_field(field: &str) -> bool {
    field == "specification"
        || NUMERIC_FIELDS.contains(&field)
        || DERIVED_FIELDS.contains(&field)
        || CATEGORICAL_FIELDS.contains(&field)
}

fn unwrap_scalar(value: Value) -> Value {
    match value {
        Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
        other => other,
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A model-ready feature row.
///
/// Numeric columns are always filled; text columns stay `None` when the
/// caller never supplied them. Unknown request fields ride along in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DerivedFeatureRow {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub static_pressure_mmaq: f64,
    pub horsepower_hp: f64,
    pub airflow_ncmm: f64,
    pub operating_temperature_c: f64,
    pub purchase_quantity: f64,
    pub impeller_diameter_mm: f64,

    pub volume: f64,
    pub power_density: f64,
    pub airflow_efficiency: f64,
    pub pressure_efficiency: f64,
    pub length_width_ratio: f64,
    pub height_width_ratio: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specification: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlet_direction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub casing_material: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_material: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drive_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub single_double_suction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fan_grade: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DerivedFeatureRow {
    /// All columns the price model is fed, in schema order.
    pub fn columns() -> Vec<&'static str> {
        NUMERIC_FIELDS
            .iter()
            .chain(DERIVED_FIELDS.iter())
            .chain(CATEGORICAL_FIELDS.iter())
            .copied()
            .chain(std::iter::once("specification"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rejects_non_object_payload() {
        assert!(RawSpecification::from_value(json!([1, 2, 3])).is_err());
        assert!(RawSpecification::from_value(json!("text")).is_err());
        assert!(RawSpecification::from_value(json!({})).is_ok());
    }

    #[test]
    fn test_list_values_unwrap_to_first_element() {
        let raw = RawSpecification::from_value(json!({
            "length": [100.0, 999.0],
            "model": ["FX-200"],
            "series": [],
        }))
        .unwrap();

        assert_eq!(raw.number("length"), Some(100.0));
        assert_eq!(raw.text("model").as_deref(), Some("FX-200"));
        assert_eq!(raw.text("series"), None);
    }

    #[test]
    fn test_number_coercion() {
        let raw = RawSpecification::from_value(json!({
            "length": "120.5",
            "width": 80,
            "height": "N/A",
            "horsepower_hp": "  15 ",
        }))
        .unwrap();

        assert_eq!(raw.number("length"), Some(120.5));
        assert_eq!(raw.number("width"), Some(80.0));
        assert_eq!(raw.number("height"), None);
        assert_eq!(raw.number("horsepower_hp"), Some(15.0));
        assert_eq!(raw.number("airflow_ncmm"), None);
    }

    #[test]
    fn test_text_coercion() {
        let raw = RawSpecification::from_value(json!({
            "model": 350,
            "series": "  ",
            "fan_grade": null,
        }))
        .unwrap();

        assert_eq!(raw.text("model").as_deref(), Some("350"));
        assert_eq!(raw.text("series"), None);
        assert_eq!(raw.text("fan_grade"), None);
        assert!(raw.contains("fan_grade"));
        assert!(!raw.contains("product_name"));
    }

    #[test]
    fn test_unknown_fields_pass_through() {
        let raw = RawSpecification::from_value(json!({
            "length": 100,
            "warehouse_code": "W-7",
        }))
        .unwrap();

        let extra = raw.unknown_fields();
        assert_eq!(extra.len(), 1);
        assert!(extra.contains_key("warehouse_code"));
    }

    #[test]
    fn test_column_listing_is_complete() {
        let columns = DerivedFeatureRow::columns();
        assert_eq!(columns.len(), 26);
        assert!(columns.contains(&"volume"));
        assert!(columns.contains(&"specification"));
    }
}
