//! Error types for alphadesk-core.

use thiserror::Error;

use crate::time_range::InvalidRangeError;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    InvalidRange(#[from] InvalidRangeError),

    #[error("Invalid update: {0}")]
    InvalidUpdate(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
