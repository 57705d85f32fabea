//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` where a
//! configuration or coordinate problem can surface through them.

use thiserror::Error;

/// Errors produced by `sr-core`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid coordinate ({lat}, {lon})")]
    InvalidCoordinate { lat: f64, lon: f64 },
}

/// Shorthand result type for `sr-core`.
pub type CoreResult<T> = Result<T, CoreError>;
