//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("API error: {0}")]
    Api(#[from] alphadesk_api::ApiError),

    #[error("Viewer error: {0}")]
    Viewer(#[from] alphadesk_viewer::ViewerError),

    #[error("Validation error: {0}")]
    Core(#[from] alphadesk_core::CoreError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] alphadesk_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
