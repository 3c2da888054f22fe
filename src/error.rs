//! Error types for query evaluation

use thiserror::Error;

/// Main error type for query evaluation operations
#[derive(Error, Debug)]
pub enum QueryError {
    /// Descriptor failed validation before evaluation
    #[error("Invalid query descriptor: {0}")]
    InvalidDescriptor(String),

    /// Data source token is not recognized
    #[error("Unknown data source: {0}")]
    UnknownDataSource(String),

    /// Time range token could not be resolved to a window
    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),

    /// Record store read failed; propagated to the caller, never retried here
    #[error("Record store error: {0}")]
    Store(String),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, QueryError>;
