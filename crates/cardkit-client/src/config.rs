//! Directory client configuration.
//!
//! Defaults point at the production directory. Override via environment
//! variables or explicit construction for staging and tests.

use url::Url;

/// Default directory base URL.
pub const DEFAULT_SERVICE_URL: &str = "https://api.virgilsecurity.com";

/// Configuration for connecting to the card directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardClientConfig {
    /// Base URL of the directory service.
    pub service_url: Url,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl CardClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `CARDKIT_SERVICE_URL` (default: `https://api.virgilsecurity.com`)
    /// - `CARDKIT_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            service_url: env_url("CARDKIT_SERVICE_URL", DEFAULT_SERVICE_URL)?,
            timeout_secs: std::env::var("CARDKIT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        })
    }

    /// Configuration with an explicit base URL and the default timeout.
    pub fn with_url(service_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            service_url: Url::parse(service_url)
                .map_err(|e| ConfigError::InvalidUrl(service_url.to_string(), e.to_string()))?,
            timeout_secs: 30,
        })
    }

    /// Configuration pointing at a local mock server.
    pub fn local_mock(port: u16) -> Result<Self, ConfigError> {
        let service_url = Url::parse(&format!("http://127.0.0.1:{port}"))
            .map_err(|e| ConfigError::InvalidUrl("localhost".to_string(), e.to_string()))?;
        Ok(Self {
            service_url,
            timeout_secs: 5,
        })
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_mock_builds_valid_config() {
        let cfg = CardClientConfig::local_mock(9000).unwrap();
        assert_eq!(cfg.timeout_secs, 5);
        assert_eq!(cfg.service_url.as_str(), "http://127.0.0.1:9000/");
    }

    #[test]
    fn env_url_uses_default_when_var_absent() {
        let url = env_url("CARDKIT_NONEXISTENT_VAR_12345", DEFAULT_SERVICE_URL).unwrap();
        assert_eq!(url.as_str(), "https://api.virgilsecurity.com/");
    }

    #[test]
    fn with_url_rejects_garbage() {
        assert!(matches!(
            CardClientConfig::with_url("not a url"),
            Err(ConfigError::InvalidUrl(..))
        ));
    }
}
