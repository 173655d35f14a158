//! Tolerant Query Construction
//!
//! Compiles partial search parameters into a typed predicate list, then
//! renders it into bound SQL. User values never reach the query text.

use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite};

/// Relative band for dimension-like columns (±20%).
const DIMENSION_TOLERANCE: f64 = 0.2;
/// Relative band for performance columns (±30%).
const PERFORMANCE_TOLERANCE: f64 = 0.3;

/// Optional search parameters for the history endpoint.
///
/// Everything arrives as a plain string. A numeric parameter that fails to
/// parse is dropped from the predicate set, not rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuerySpec {
    pub length: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub static_pressure: Option<String>,
    pub horsepower: Option<String>,
    pub airflow: Option<String>,
    pub impeller_diameter: Option<String>,
    pub material: Option<String>,
    pub casing_material: Option<String>,
    pub frame_material: Option<String>,
    pub product_name: Option<String>,
    pub model: Option<String>,
    pub outlet_direction: Option<String>,
    pub drive_method: Option<String>,
}

/// A single search clause with its bound values.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Inclusive numeric band on one column
    Between {
        column: &'static str,
        low: f64,
        high: f64,
    },
    /// Substring match over one or more columns, OR-combined
    Contains {
        columns: &'static [&'static str],
        needle: String,
    },
}

impl HistoryQuerySpec {
    /// Compile the supplied parameters into predicates. The renderer
    /// combines them with AND at the top level.
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut out = Vec::new();

        range(&mut out, "f.length", &self.length, DIMENSION_TOLERANCE);
        range(&mut out, "f.width", &self.width, DIMENSION_TOLERANCE);
        range(&mut out, "f.height", &self.height, DIMENSION_TOLERANCE);
        range(
            &mut out,
            "f.static_pressure_mmaq",
            &self.static_pressure,
            PERFORMANCE_TOLERANCE,
        );
        range(
            &mut out,
            "f.horsepower_hp",
            &self.horsepower,
            PERFORMANCE_TOLERANCE,
        );
        range(
            &mut out,
            "f.airflow_ncmm",
            &self.airflow,
            PERFORMANCE_TOLERANCE,
        );
        range(
            &mut out,
            "f.impeller_diameter_mm",
            &self.impeller_diameter,
            DIMENSION_TOLERANCE,
        );

        // material fans out across the generic and casing columns
        contains(
            &mut out,
            &["f.material", "f.casing_material"],
            &self.material,
        );
        contains(&mut out, &["f.casing_material"], &self.casing_material);
        contains(&mut out, &["f.frame_material"], &self.frame_material);
        contains(&mut out, &["f.product_name"], &self.product_name);
        // model searches both columns to honor the specification/model aliasing
        contains(&mut out, &["f.model", "f.specification"], &self.model);
        contains(&mut out, &["f.outlet_direction"], &self.outlet_direction);
        contains(&mut out, &["f.drive_method"], &self.drive_method);

        out
    }
}

fn supplied(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

fn range(out: &mut Vec<Predicate>, column: &'static str, value: &Option<String>, tolerance: f64) {
    let Some(text) = supplied(value) else {
        return;
    };
    let Ok(center) = text.parse::<f64>() else {
        return;
    };
    out.push(Predicate::Between {
        column,
        low: center * (1.0 - tolerance),
        high: center * (1.0 + tolerance),
    });
}

fn contains(out: &mut Vec<Predicate>, columns: &'static [&'static str], value: &Option<String>) {
    if let Some(needle) = supplied(value) {
        out.push(Predicate::Contains {
            columns,
            needle: needle.to_string(),
        });
    }
}

/// Append the predicate list to a query already carrying a WHERE clause.
/// Clauses are AND-combined; every user value goes through `push_bind`.
pub(crate) fn push_predicates(builder: &mut QueryBuilder<'_, Sqlite>, predicates: &[Predicate]) {
    for predicate in predicates {
        builder.push(" AND ");
        match predicate {
            Predicate::Between { column, low, high } => {
                builder.push("(");
                builder.push(*column);
                builder.push(" BETWEEN ");
                builder.push_bind(*low);
                builder.push(" AND ");
                builder.push_bind(*high);
                builder.push(")");
            }
            Predicate::Contains { columns, needle } => {
                builder.push("(");
                for (i, column) in columns.iter().enumerate() {
                    if i > 0 {
                        builder.push(" OR ");
                    }
                    builder.push(*column);
                    builder.push(" LIKE ");
                    builder.push_bind(format!("%{needle}%"));
                }
                builder.push(")");
            }
        }
    }
}
