//! Client configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Base path that logical query names are resolved against.
pub const DEFAULT_ANALYTICS_BASE: &str = "/analytics/query";

/// Status code the analytics API answers with while a query is still being computed.
pub const PROCESSING_STATUS: u16 = 202;

/// Retries after the first "still processing" answer before giving up.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Delay between polling attempts, in milliseconds.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 15_000;

/// Quiet period before buffered fragment updates are committed, in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Top-level client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base path for logical query names (e.g. `/analytics/query`).
    #[serde(default = "default_analytics_base")]
    pub analytics_base: String,

    /// Origin prepended to relative paths by transports that need absolute URLs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,

    /// Polling policy for queries answered with 202.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Fragment synchronizer settings.
    #[serde(default)]
    pub fragments: FragmentConfig,
}

fn default_analytics_base() -> String {
    DEFAULT_ANALYTICS_BASE.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            analytics_base: default_analytics_base(),
            origin: None,
            retry: RetryConfig::default(),
            fragments: FragmentConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Set the origin used for absolute URLs.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from JSON text.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file. `.json` files are parsed as JSON, everything else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.analytics_base.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "analytics_base",
                message: "must not be empty".to_string(),
            });
        }
        if let Some(origin) = &self.origin {
            if !origin.starts_with("http://") && !origin.starts_with("https://") {
                return Err(ConfigError::Invalid {
                    field: "origin",
                    message: format!("expected an http(s) origin, got {:?}", origin),
                });
            }
        }
        Ok(())
    }
}

/// Polling policy for queries the server is still computing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the initial attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed delay between attempts, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY_MS
}

impl RetryConfig {
    /// Delay between attempts.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

/// Fragment synchronizer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentConfig {
    /// Debounce window for debounced keys, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Store values equal to the default instead of clearing the override.
    #[serde(default)]
    pub keep_defaults: bool,
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

impl FragmentConfig {
    /// Debounce window.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for FragmentConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            keep_defaults: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.analytics_base, "/analytics/query");
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.delay(), Duration::from_secs(15));
        assert_eq!(config.fragments.debounce(), Duration::from_millis(100));
        assert!(!config.fragments.keep_defaults);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = ClientConfig::from_toml_str(
            r#"
            origin = "https://hsreplay.net"

            [retry]
            delay_ms = 500
            "#,
        )
        .unwrap();
        assert_eq!(config.origin.as_deref(), Some("https://hsreplay.net"));
        assert_eq!(config.retry.delay_ms, 500);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.analytics_base, DEFAULT_ANALYTICS_BASE);
    }

    #[test]
    fn test_json_config() {
        let config =
            ClientConfig::from_json_str(r#"{"fragments": {"keep_defaults": true}}"#).unwrap();
        assert!(config.fragments.keep_defaults);
        assert_eq!(config.fragments.debounce_ms, 100);
    }

    #[test]
    fn test_invalid_origin_rejected() {
        let result = ClientConfig::from_toml_str(r#"origin = "ftp://example.com""#);
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { field: "origin", .. })
        ));
    }

    #[test]
    fn test_empty_base_rejected() {
        let result = ClientConfig::from_toml_str(r#"analytics_base = " ""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let result = ClientConfig::load("/definitely/not/here.toml");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
