use crate::error::{PixelLabError, Result};
use std::env;
use std::time::Duration;

pub const API_KEY_VAR: &str = "PIXELLAB_API_KEY";
pub const API_BASE_VAR: &str = "PIXELLAB_API_BASE";
pub const TIMEOUT_VAR: &str = "PIXELLAB_TIMEOUT_SECS";

pub const DEFAULT_API_BASE: &str = "https://api.pixellab.ai";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Process-wide settings, loaded once at start and handed to the client.
#[derive(Clone)]
pub struct PixelLabConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for PixelLabConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelLabConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for PixelLabConfig {
    fn default() -> Self {
        PixelLabConfig {
            api_key: None,
            base_url: DEFAULT_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl PixelLabConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = env::var(API_KEY_VAR)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        let base_url = env::var(API_BASE_VAR)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let timeout_secs = env::var(TIMEOUT_VAR)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        PixelLabConfig {
            api_key,
            base_url,
            timeout_secs,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The bearer credential, or a configuration error when it was never set.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                PixelLabError::ConfigError(format!("{} environment variable is not set", API_KEY_VAR))
            })
    }

    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_config_error() {
        let config = PixelLabConfig::new();
        let err = config.require_api_key().unwrap_err();
        assert_eq!(err.kind(), "configuration");
        assert!(err.to_string().contains(API_KEY_VAR));
    }

    #[test]
    fn test_builder_and_url_join() {
        let config = PixelLabConfig::new()
            .with_api_key("secret")
            .with_base_url("http://127.0.0.1:9000/")
            .with_timeout(5);
        assert_eq!(config.require_api_key().unwrap(), "secret");
        assert_eq!(config.endpoint_url("/v1/balance"), "http://127.0.0.1:9000/v1/balance");
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = PixelLabConfig::new().with_api_key("secret");
        assert!(!format!("{:?}", config).contains("secret"));
    }
}
