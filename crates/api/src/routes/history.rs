//! History Route

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;
use tracing::debug;

use crate::{ApiError, AppState};
use storage::{HistoryQuerySpec, HistoryRecord};

/// Search historical purchase records with tolerant matching.
///
/// Zero matches is an empty list, never an error; a store failure is a
/// structured error response.
pub async fn search_history(
    State(state): State<Arc<AppState>>,
    Query(spec): Query<HistoryQuerySpec>,
) -> Result<Json<Vec<HistoryRecord>>, ApiError> {
    let records = state.repository.search(&spec).await?;
    debug!(matches = records.len(), "history search completed");
    Ok(Json(records))
}
