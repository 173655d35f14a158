//! Feature Derivation

use tracing::debug;

use crate::row::{DerivedFeatureRow, RawSpecification, UNKNOWN};

/// Median fill values for the non-dimension numeric columns of one batch.
#[derive(Debug, Clone, Copy, Default)]
struct ColumnFills {
    static_pressure_mmaq: f64,
    horsepower_hp: f64,
    airflow_ncmm: f64,
    operating_temperature_c: f64,
    purchase_quantity: f64,
    impeller_diameter_mm: f64,
}

/// Derives model-ready feature rows from raw specifications.
///
/// The transformation is pure: coercion failures and missing fields are
/// absorbed by the fill policy, never surfaced as errors.
pub struct FeatureDeriver {
    /// Substitute for a safe divide with a non-positive denominator
    divide_fill: f64,
}

impl FeatureDeriver {
    /// Create a deriver with the standard fill policy.
    pub fn new() -> Self {
        Self { divide_fill: 0.0 }
    }

    /// Derive a single row. Equivalent to a singleton batch: medians
    /// degenerate to the row's own value, or 0 when the field is unusable.
    pub fn derive(&self, raw: &RawSpecification) -> DerivedFeatureRow {
        self.derive_batch(std::slice::from_ref(raw))
            .pop()
            .unwrap_or_default()
    }

    /// Derive a batch of rows with column-median imputation across the batch.
    pub fn derive_batch(&self, batch: &[RawSpecification]) -> Vec<DerivedFeatureRow> {
        let fills = Self::column_fills(batch);
        debug!(rows = batch.len(), "deriving feature batch");
        batch.iter().map(|raw| self.derive_row(raw, &fills)).collect()
    }

    /// Median of each non-dimension numeric column over the batch.
    /// Columns with no usable value fall back to 0.
    fn column_fills(batch: &[RawSpecification]) -> ColumnFills {
        let fill = |field: &str| {
            let observed: Vec<f64> = batch.iter().filter_map(|raw| raw.number(field)).collect();
            median(&observed).unwrap_or(0.0)
        };

        ColumnFills {
            static_pressure_mmaq: fill("static_pressure_mmaq"),
            horsepower_hp: fill("horsepower_hp"),
            airflow_ncmm: fill("airflow_ncmm"),
            operating_temperature_c: fill("operating_temperature_c"),
            purchase_quantity: fill("purchase_quantity"),
            impeller_diameter_mm: fill("impeller_diameter_mm"),
        }
    }

    fn derive_row(&self, raw: &RawSpecification, fills: &ColumnFills) -> DerivedFeatureRow {
        let mut row = DerivedFeatureRow::default();

        // Dimensions fill with 0, every other numeric column with its batch median.
        row.length = raw.number("length").unwrap_or(0.0);
        row.width = raw.number("width").unwrap_or(0.0);
        row.height = raw.number("height").unwrap_or(0.0);
        row.static_pressure_mmaq = raw
            .number("static_pressure_mmaq")
            .unwrap_or(fills.static_pressure_mmaq);
        row.horsepower_hp = raw.number("horsepower_hp").unwrap_or(fills.horsepower_hp);
        row.airflow_ncmm = raw.number("airflow_ncmm").unwrap_or(fills.airflow_ncmm);
        row.operating_temperature_c = raw
            .number("operating_temperature_c")
            .unwrap_or(fills.operating_temperature_c);
        row.purchase_quantity = raw
            .number("purchase_quantity")
            .unwrap_or(fills.purchase_quantity);
        row.impeller_diameter_mm = raw
            .number("impeller_diameter_mm")
            .unwrap_or(fills.impeller_diameter_mm);

        // Derived columns, strictly after fill. Volume feeds power density.
        row.volume = row.length * row.width * row.height;
        row.power_density = self.safe_divide(row.horsepower_hp, row.volume);
        row.airflow_efficiency = self.safe_divide(row.airflow_ncmm, row.horsepower_hp);
        row.pressure_efficiency = self.safe_divide(row.static_pressure_mmaq, row.horsepower_hp);
        row.length_width_ratio = self.safe_divide(row.length, row.width);
        row.height_width_ratio = self.safe_divide(row.height, row.width);

        // Categorical columns: blank values supplied by the caller become
        // "unknown"; columns the caller never sent stay unset.
        row.series = categorical(raw, "series");
        row.model = categorical(raw, "model");
        row.specification = categorical(raw, "specification");
        row.outlet_direction = categorical(raw, "outlet_direction");
        row.casing_material = categorical(raw, "casing_material");
        row.frame_material = categorical(raw, "frame_material");
        row.product_name = categorical(raw, "product_name");
        row.drive_method = categorical(raw, "drive_method");
        row.single_double_suction = categorical(raw, "single_double_suction");
        row.fan_grade = categorical(raw, "fan_grade");

        row.extra = raw.unknown_fields();

        // Aliasing runs last: it reads fields finalized above.
        match (&row.specification, &row.model) {
            (Some(spec), None) => row.model = Some(spec.clone()),
            (None, Some(model)) => row.specification = Some(model.clone()),
            _ => {}
        }

        row
    }

    /// Divide with a fill value instead of raising on a non-positive denominator.
    fn safe_divide(&self, numerator: f64, denominator: f64) -> f64 {
        if denominator > 0.0 {
            numerator / denominator
        } else {
            self.divide_fill
        }
    }
}

impl Default for FeatureDeriver {
    fn default() -> Self {
        Self::new()
    }
}

fn categorical(raw: &RawSpecification, field: &str) -> Option<String> {
    raw.contains(field)
        .then(|| raw.text(field).unwrap_or_else(|| UNKNOWN.to_string()))
}

/// Median of a slice. `None` when empty. Even-length slices average the
/// two middle values.
fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    })
}
