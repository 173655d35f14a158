//! API Error Responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use feature_engine::{DeriveError, DerivedFeatureRow};
use price_model::ModelError;
use serde::Serialize;
use storage::StorageError;
use thiserror::Error;
use tracing::error;

/// Structured error payload returned to callers
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    /// Feature columns known at failure time, for diagnostics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_columns: Option<Vec<&'static str>>,
}

/// Boundary errors mapped onto HTTP responses
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body could not be interpreted as a specification record
    #[error("malformed specification: {0}")]
    MalformedInput(#[from] DeriveError),
    /// The model rejected or failed the prediction
    #[error("prediction failed: {0}")]
    Prediction(#[from] ModelError),
    /// The order store was unreachable or the query failed
    #[error("history search failed: {0}")]
    Search(#[from] StorageError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("{self}");
        let (status, body) = match &self {
            ApiError::MalformedInput(err) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: err.to_string(),
                    message: "specification could not be interpreted".to_string(),
                    available_columns: Some(DerivedFeatureRow::columns()),
                },
            ),
            ApiError::Prediction(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: err.to_string(),
                    message: "error during price prediction".to_string(),
                    available_columns: None,
                },
            ),
            ApiError::Search(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: err.to_string(),
                    message: "error while fetching order history".to_string(),
                    available_columns: None,
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}
