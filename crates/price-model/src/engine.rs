//! Regression Engine Implementation

use crate::ModelError;
use feature_engine::DerivedFeatureRow;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A predicted unit price for one feature row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePrediction {
    /// Predicted unit price
    pub unit_price: f64,
}

/// ONNX regression engine (mock implementation until a model artifact ships).
///
/// The model is a black box: it consumes rows whose columns match
/// `DerivedFeatureRow` exactly and returns one price per row.
pub struct PriceModel {
    /// Model path
    model_path: String,
    /// Whether model is loaded
    loaded: bool,
    /// Enable mock mode (no actual model)
    mock_mode: bool,
}

impl PriceModel {
    /// Create a new price model for the given artifact path.
    pub fn new(model_path: &str) -> Result<Self, ModelError> {
        info!("creating price model from {}", model_path);

        Ok(Self {
            model_path: model_path.to_string(),
            loaded: false,
            mock_mode: true, // mock until a real artifact is mounted
        })
    }

    /// Create a mock model for testing.
    pub fn mock() -> Self {
        info!("creating mock price model");
        Self {
            model_path: "mock".to_string(),
            loaded: true,
            mock_mode: true,
        }
    }

    /// Load the ONNX regression model.
    pub fn load(&mut self) -> Result<(), ModelError> {
        if self.mock_mode {
            debug!("mock mode: skipping model load");
            self.loaded = true;
            return Ok(());
        }

        // In real implementation:
        // let model = tract_onnx::onnx()
        //     .model_for_path(&self.model_path)?
        //     .into_optimized()?
        //     .into_runnable()?;

        info!("model loaded successfully");
        self.loaded = true;
        Ok(())
    }

    /// Predict unit prices for a batch of feature rows.
    pub async fn predict(
        &self,
        rows: &[DerivedFeatureRow],
    ) -> Result<Vec<PricePrediction>, ModelError> {
        if !self.loaded {
            return Err(ModelError::ModelLoadError("model not loaded".to_string()));
        }

        let predictions = rows
            .iter()
            .map(|row| {
                if self.mock_mode {
                    self.mock_predict(row)
                } else {
                    // Real ONNX inference would run the tract model here,
                    // feeding the row's columns in schema order.
                    self.mock_predict(row)
                }
            })
            .collect();

        debug!(rows = rows.len(), "prediction batch completed");
        Ok(predictions)
    }

    /// Predict the unit price for a single feature row.
    pub async fn predict_one(&self, row: &DerivedFeatureRow) -> Result<PricePrediction, ModelError> {
        let mut batch = self.predict(std::slice::from_ref(row)).await?;
        batch
            .pop()
            .ok_or_else(|| ModelError::PredictionFailed("empty prediction batch".to_string()))
    }

    /// Deterministic stand-in regression over the derived features.
    fn mock_predict(&self, row: &DerivedFeatureRow) -> PricePrediction {
        // Rough linear surrogate for the trained model: power and airflow
        // dominate price, volume and stainless casing add premiums.
        let mut price = 8_000.0;
        price += row.horsepower_hp * 2_400.0;
        price += row.airflow_ncmm * 85.0;
        price += row.static_pressure_mmaq * 12.0;
        price += row.volume * 0.0004;
        price += row.impeller_diameter_mm * 9.0;

        if let Some(casing) = &row.casing_material {
            if casing.contains("SUS") {
                price *= 1.35;
            }
        }

        PricePrediction {
            unit_price: price.max(0.0),
        }
    }

    /// Check if the model is loaded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Get the model artifact path.
    pub fn model_path(&self) -> &str {
        &self.model_path
    }
}
