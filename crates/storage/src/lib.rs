//! Order History Storage
//!
//! Read path over past procurement orders with tolerant, ranked search.

mod query;
mod repository;

pub use query::{HistoryQuerySpec, Predicate};
pub use repository::{HistoryRecord, OrderRepository};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
