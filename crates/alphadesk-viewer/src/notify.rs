//! Operator notifications.
//!
//! Failures are reported as non-blocking notifications instead of being
//! propagated to the screen that triggered them. Delivery goes through a
//! broadcast channel; having no subscribers is normal.

use alphadesk_api::ApiError;
use alphadesk_telemetry::Metrics;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, trace, warn};

/// Prefix put in front of every API failure message.
pub const DEFAULT_ERROR_PREFIX: &str = "Request failed";

const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

impl NotificationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    /// What the operator was doing, e.g. "Load older messages".
    pub title: String,
    pub message: String,
}

/// Publishes notifications to every subscriber.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
    error_prefix: String,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_PREFIX, DEFAULT_CAPACITY)
    }
}

impl Notifier {
    pub fn new(error_prefix: impl Into<String>, capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            error_prefix: error_prefix.into(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn publish(&self, notification: Notification) {
        Metrics::notification(notification.level.as_str());
        match notification.level {
            NotificationLevel::Error => {
                warn!(title = %notification.title, message = %notification.message, "Notification")
            }
            _ => info!(title = %notification.title, message = %notification.message, "Notification"),
        }
        if self.tx.send(notification).is_err() {
            trace!("No notification subscribers");
        }
    }

    /// Report a failed API call as "<prefix>: <server message | Unknown>".
    pub fn api_failure(&self, title: &str, error: &ApiError) -> Notification {
        let notification = Notification {
            level: NotificationLevel::Error,
            title: title.to_string(),
            message: format!("{}: {}", self.error_prefix, error.user_message()),
        };
        self.publish(notification.clone());
        notification
    }

    pub fn success(&self, title: &str, message: impl Into<String>) {
        self.publish(Notification {
            level: NotificationLevel::Success,
            title: title.to_string(),
            message: message.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_api_failure_uses_server_message() {
        let notifier = Notifier::default();
        let mut rx = notifier.subscribe();

        notifier.api_failure(
            "Update alias",
            &ApiError::Status {
                status: 400,
                message: Some("Alias is locked".to_string()),
            },
        );

        let received = rx.recv().await.unwrap();
        assert_eq!(received.level, NotificationLevel::Error);
        assert_eq!(received.title, "Update alias");
        assert_eq!(received.message, "Request failed: Alias is locked");
    }

    #[test]
    fn test_api_failure_without_message_is_unknown() {
        let notifier = Notifier::new("Error", 4);
        let n = notifier.api_failure("Load", &ApiError::Transport("timeout".to_string()));
        assert_eq!(n.message, "Error: Unknown");
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        Notifier::default().success("Saved", "Swap rule 3 updated");
    }
}
