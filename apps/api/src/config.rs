//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//! The gateway key and webhook secret have no default.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use stockflow_db::DbConfig;
use stockflow_gateway::{GatewayConfig, GatewayResult, DEFAULT_BASE_URL};

/// API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP port
    pub port: u16,

    /// Interface to bind
    pub bind_addr: String,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub db_max_connections: u32,

    /// EuPago REST base URL
    pub eupago_base_url: String,

    /// EuPago API key (`chave`)
    pub eupago_api_key: String,

    /// Shared secret for webhook signatures
    pub webhook_secret: String,

    /// Per-request gateway timeout in seconds
    pub gateway_timeout_secs: u64,

    /// Retries after a retryable gateway failure
    pub gateway_max_retries: u32,

    /// First retry wait in milliseconds
    pub gateway_initial_backoff_ms: u64,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup (the environment in
    /// production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingRequired(key.to_string()))
        };

        Ok(ApiConfig {
            port: parse("STOCKFLOW_PORT", &value("STOCKFLOW_PORT", "8080"))?,

            bind_addr: value("STOCKFLOW_BIND_ADDR", "0.0.0.0"),

            database_path: PathBuf::from(value("STOCKFLOW_DATABASE_PATH", "./stockflow.db")),

            db_max_connections: parse(
                "STOCKFLOW_DB_MAX_CONNECTIONS",
                &value("STOCKFLOW_DB_MAX_CONNECTIONS", "5"),
            )?,

            eupago_base_url: value("EUPAGO_BASE_URL", DEFAULT_BASE_URL),

            eupago_api_key: required("EUPAGO_API_KEY")?,

            webhook_secret: required("EUPAGO_WEBHOOK_SECRET")?,

            gateway_timeout_secs: parse("EUPAGO_TIMEOUT_SECS", &value("EUPAGO_TIMEOUT_SECS", "15"))?,

            gateway_max_retries: parse("EUPAGO_MAX_RETRIES", &value("EUPAGO_MAX_RETRIES", "2"))?,

            gateway_initial_backoff_ms: parse(
                "EUPAGO_INITIAL_BACKOFF_MS",
                &value("EUPAGO_INITIAL_BACKOFF_MS", "250"),
            )?,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue("STOCKFLOW_BIND_ADDR".to_string()))
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone()).max_connections(self.db_max_connections)
    }

    pub fn gateway_config(&self) -> GatewayResult<GatewayConfig> {
        Ok(GatewayConfig::new(&self.eupago_base_url, self.eupago_api_key.clone())?
            .timeout(Duration::from_secs(self.gateway_timeout_secs))
            .max_retries(self.gateway_max_retries)
            .initial_backoff(Duration::from_millis(self.gateway_initial_backoff_ms)))
    }
}

fn parse<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("EUPAGO_API_KEY", "key"),
            ("EUPAGO_WEBHOOK_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.eupago_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.gateway_timeout_secs, 15);
        assert_eq!(config.gateway_max_retries, 2);
        assert_eq!(config.socket_addr().unwrap().port(), 8080);

        let gateway = config.gateway_config().unwrap();
        assert_eq!(gateway.initial_backoff, Duration::from_millis(250));
    }

    #[test]
    fn test_missing_secret() {
        let result = ApiConfig::from_lookup(lookup(&[
            ("EUPAGO_API_KEY", "key"),
            ("EUPAGO_WEBHOOK_SECRET", "  "),
        ]));
        assert!(matches!(result, Err(ConfigError::MissingRequired(k)) if k == "EUPAGO_WEBHOOK_SECRET"));
    }

    #[test]
    fn test_invalid_port() {
        let result = ApiConfig::from_lookup(lookup(&[
            ("STOCKFLOW_PORT", "http"),
            ("EUPAGO_API_KEY", "key"),
            ("EUPAGO_WEBHOOK_SECRET", "secret"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidValue(k)) if k == "STOCKFLOW_PORT"));
    }
}
