//! API error types.

use alphadesk_core::CoreError;
use thiserror::Error;

/// Message shown when the server did not explain a failure.
pub const UNKNOWN_SERVER_MESSAGE: &str = "Unknown";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or(UNKNOWN_SERVER_MESSAGE))]
    Status { status: u16, message: Option<String> },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] CoreError),

    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ApiError {
    /// Message supplied by the server, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Text shown to the operator after a fixed prefix.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { message, .. } => message
                .clone()
                .unwrap_or_else(|| UNKNOWN_SERVER_MESSAGE.to_string()),
            Self::Validation(e) => e.to_string(),
            _ => UNKNOWN_SERVER_MESSAGE.to_string(),
        }
    }

    /// Metric label for the failure class.
    pub fn outcome_label(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Status { .. } => "status",
            Self::Decode(_) => "decode",
            Self::Validation(_) => "validation",
            Self::InvalidConfig(_) => "config",
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_falls_back_to_unknown() {
        let err = ApiError::Status {
            status: 500,
            message: None,
        };
        assert_eq!(err.user_message(), "Unknown");
        assert_eq!(err.to_string(), "HTTP 500: Unknown");

        let err = ApiError::Status {
            status: 404,
            message: Some("Alias not found".to_string()),
        };
        assert_eq!(err.user_message(), "Alias not found");
        assert_eq!(err.server_message(), Some("Alias not found"));
    }

    #[test]
    fn test_transport_has_no_server_message() {
        let err = ApiError::Transport("connection refused".to_string());
        assert_eq!(err.server_message(), None);
        assert_eq!(err.user_message(), "Unknown");
        assert_eq!(err.outcome_label(), "transport");
    }
}
