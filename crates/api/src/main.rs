//! Blower Price API - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server, ApiConfig, AppState};
use price_model::PriceModel;
use std::sync::Arc;
use storage::OrderRepository;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = ApiConfig::load().context("loading configuration")?;
    info!("=== Blower Price API v{} ===", env!("CARGO_PKG_VERSION"));

    let repository = OrderRepository::connect(&config.database_url)
        .await
        .context("connecting order store")?;
    repository
        .ensure_schema()
        .await
        .context("preparing order tables")?;

    let mut model = PriceModel::new(&config.model_path)?;
    model.load()?;

    let state = Arc::new(AppState::new(model, repository));
    run_server(&config.bind_addr, state).await?;

    Ok(())
}
