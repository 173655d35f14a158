//! Price Prediction Model
//!
//! Wraps the pretrained unit-price regression model as an opaque black box:
//! feature rows in, predicted prices out.

mod engine;

pub use engine::{PriceModel, PricePrediction};

use thiserror::Error;

/// Errors during price prediction
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model load failed: {0}")]
    ModelLoadError(String),
    #[error("prediction failed: {0}")]
    PredictionFailed(String),
}
