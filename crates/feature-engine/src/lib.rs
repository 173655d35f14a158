//! Feature Derivation Engine
//!
//! Normalizes raw blower specifications into the feature rows the pretrained
//! price model expects.

mod derive;
mod row;

pub use derive::FeatureDeriver;
pub use row::{
    DerivedFeatureRow, RawSpecification, CATEGORICAL_FIELDS, DERIVED_FIELDS, DIMENSION_FIELDS,
    NUMERIC_FIELDS, UNKNOWN,
};

use thiserror::Error;

/// Errors raised while interpreting a raw specification
#[derive(Debug, Clone, Error)]
pub enum DeriveError {
    /// The submitted payload was not a key/value mapping
    #[error("specification payload must be a JSON object")]
    NotAMapping,
}
