//! Collaborator failure type.

use thiserror::Error;

/// A road or traffic collaborator could not produce data.
///
/// The planner never propagates these; they are logged and the request
/// continues with no data for that cycle.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("data source unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GeoJSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

pub type SourceResult<T> = Result<T, SourceError>;
