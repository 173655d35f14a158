//! Runtime Configuration

use serde::Deserialize;

/// API runtime configuration.
///
/// Defaults match the original deployment; every field can be overridden
/// through a `BLOWER_`-prefixed environment variable.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Listener address
    pub bind_addr: String,
    /// Connection string for the order store
    pub database_url: String,
    /// Path to the regression model artifact
    pub model_path: String,
}

impl ApiConfig {
    /// Load configuration from defaults and the environment.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        ::config::Config::builder()
            .set_default("bind_addr", "0.0.0.0:8081")?
            .set_default("database_url", "sqlite://procurement_data.db?mode=rwc")?
            .set_default("model_path", "models/price_model.onnx")?
            .add_source(::config::Environment::with_prefix("BLOWER"))
            .build()?
            .try_deserialize()
    }
}
