//! Configuration management for the server.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use banner_engine::{DEFAULT_MAX_ACTIVE, REORDER_DEBOUNCE_MS};

use crate::sort::EngineConfig;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Base URL of the remote banner API
    pub banner_api_url: String,
    /// Bearer token forwarded to the remote banner API
    pub banner_api_token: Option<String>,
    /// Maximum number of active banners
    pub max_active: usize,
    /// Quiet period before a reorder is committed
    pub reorder_debounce: Duration,
    /// Timeout for a single remote call
    pub remote_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_or("PORT", 3000)?;

        let banner_api_url =
            env::var("BANNER_API_URL").map_err(|_| ConfigError::MissingBannerApiUrl)?;
        let banner_api_token = env::var("BANNER_API_TOKEN").ok().filter(|t| !t.is_empty());

        let max_active = parse_or("MAX_ACTIVE_BANNERS", DEFAULT_MAX_ACTIVE)?;
        let reorder_debounce =
            Duration::from_millis(parse_or("REORDER_DEBOUNCE_MS", REORDER_DEBOUNCE_MS)?);
        let remote_timeout = Duration::from_millis(parse_or("REMOTE_TIMEOUT_MS", 10_000)?);

        Ok(Self {
            host,
            port,
            banner_api_url,
            banner_api_token,
            max_active,
            reorder_debounce,
            remote_timeout,
        })
    }

    /// Tunables for the sort engine.
    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            max_active: self.max_active,
            debounce: self.reorder_debounce,
        }
    }
}

/// Read `name`, falling back to `default` when unset.
fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("BANNER_API_URL environment variable is required")]
    MissingBannerApiUrl,

    #[error("Invalid {name} value: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_defaults_when_unset() {
        let value: u16 = parse_or("BANNER_SERVER_TEST_UNSET_PORT", 3000).unwrap();
        assert_eq!(value, 3000);
    }

    #[test]
    fn test_parse_or_rejects_garbage() {
        env::set_var("BANNER_SERVER_TEST_BAD_LIMIT", "three");
        let result: Result<usize, _> = parse_or("BANNER_SERVER_TEST_BAD_LIMIT", 3);
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { name: "BANNER_SERVER_TEST_BAD_LIMIT", .. })
        ));
    }

    #[test]
    fn test_engine_config() {
        let config = Config {
            host: "127.0.0.1".into(),
            port: 3000,
            banner_api_url: "http://localhost:8080".into(),
            banner_api_token: None,
            max_active: 5,
            reorder_debounce: Duration::from_millis(250),
            remote_timeout: Duration::from_secs(10),
        };
        let engine = config.engine();
        assert_eq!(engine.max_active, 5);
        assert_eq!(engine.debounce, Duration::from_millis(250));
    }
}
