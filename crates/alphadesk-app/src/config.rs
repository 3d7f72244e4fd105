//! Application configuration.

use std::path::Path;
use std::time::Duration;

use alphadesk_api::ClientConfig;
use alphadesk_core::{EntityId, RelativeRange};
use alphadesk_viewer::{Notifier, DEFAULT_ERROR_PREFIX, PAGE_SIZE};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Backend connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Backend root, e.g. "https://alpha.example.com/api".
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token. Can also be set via ALPHADESK_TOKEN.
    #[serde(default)]
    pub token: Option<String>,
    /// Request timeout (seconds). Default: 10.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Feed and search behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Neighbours fetched per branch request. Default: 5.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Relative range used when none is given, e.g. "12 hours ago".
    #[serde(default = "default_range")]
    pub default_range: String,
    /// Quiet period before search-as-you-type fires (ms). Default: 300.
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
    /// Entities shown under "Listening Projects" regardless of type.
    #[serde(default)]
    pub pinned_entity_ids: Vec<i64>,
}

fn default_page_size() -> u32 {
    PAGE_SIZE
}

fn default_range() -> String {
    RelativeRange::TwelveHours.label().to_string()
}

fn default_search_debounce_ms() -> u64 {
    300
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            default_range: default_range(),
            search_debounce_ms: default_search_debounce_ms(),
            pinned_entity_ids: Vec::new(),
        }
    }
}

/// Operator notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Prefix of every failure message. Default: "Request failed".
    #[serde(default = "default_error_prefix")]
    pub error_prefix: String,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_error_prefix() -> String {
    DEFAULT_ERROR_PREFIX.to_string()
}

fn default_channel_capacity() -> usize {
    64
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            error_prefix: default_error_prefix(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

impl AppConfig {
    /// Load from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(AppError::Config("api.base_url must not be empty".to_string()));
        }
        if self.api.timeout_secs == 0 {
            return Err(AppError::Config("api.timeout_secs must be positive".to_string()));
        }
        if self.viewer.page_size == 0 {
            return Err(AppError::Config("viewer.page_size must be positive".to_string()));
        }
        if self.viewer.search_debounce_ms == 0 {
            return Err(AppError::Config(
                "viewer.search_debounce_ms must be positive".to_string(),
            ));
        }
        self.default_range()?;
        Ok(())
    }

    pub fn default_range(&self) -> AppResult<RelativeRange> {
        self.viewer
            .default_range
            .parse()
            .map_err(|e| AppError::Config(format!("viewer.default_range: {e}")))
    }

    pub fn pinned_entity_ids(&self) -> Vec<EntityId> {
        self.viewer
            .pinned_entity_ids
            .iter()
            .copied()
            .map(EntityId)
            .collect()
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.viewer.search_debounce_ms)
    }

    pub fn client_config(&self) -> ClientConfig {
        let mut client = ClientConfig::new(self.api.base_url.clone());
        client.token = self.api.token.clone();
        client.timeout = Duration::from_secs(self.api.timeout_secs);
        client
    }

    pub fn notifier(&self) -> Notifier {
        Notifier::new(
            self.notifications.error_prefix.clone(),
            self.notifications.channel_capacity,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.viewer.page_size, 5);
        assert_eq!(config.default_range().unwrap(), RelativeRange::TwelveHours);
        assert_eq!(config.notifications.error_prefix, "Request failed");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [api]
            base_url = "https://alpha.example.com/api/"
            token = "abc"

            [viewer]
            default_range = "3 days ago"
            pinned_entity_ids = [7, 9]
            "#,
        )
        .unwrap();

        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.default_range().unwrap(), RelativeRange::ThreeDays);
        assert_eq!(config.pinned_entity_ids(), vec![EntityId(7), EntityId(9)]);
        assert_eq!(config.search_debounce(), Duration::from_millis(300));

        let client = config.client_config();
        assert_eq!(client.token.as_deref(), Some("abc"));
        assert_eq!(client.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_rejects_unknown_range() {
        let err = AppConfig::from_toml("[viewer]\ndefault_range = \"last week\"").unwrap_err();
        assert!(err.to_string().contains("last week"));
    }

    #[test]
    fn test_rejects_empty_base_url_and_zero_debounce() {
        assert!(AppConfig::from_toml("[api]\nbase_url = \" \"").is_err());
        assert!(AppConfig::from_toml("[viewer]\nsearch_debounce_ms = 0").is_err());
    }

    #[test]
    fn test_config_serialization() {
        let toml_str = toml::to_string(&AppConfig::default()).unwrap();
        assert!(toml_str.contains("base_url"));
        assert!(toml_str.contains("default_range"));
    }
}
