//! # Gateway Configuration

use std::time::Duration;
use url::Url;

use crate::error::{GatewayError, GatewayResult};

/// Production base URL.
pub const DEFAULT_BASE_URL: &str = "https://clientes.eupago.pt";

/// Connection settings for the gateway.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use stockflow_gateway::GatewayConfig;
///
/// let config = GatewayConfig::new("https://sandbox.eupago.pt", "demo-key")
///     .unwrap()
///     .timeout(Duration::from_secs(10))
///     .max_retries(3);
/// assert_eq!(config.base_url.as_str(), "https://sandbox.eupago.pt/");
/// ```
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Always ends with `/` so endpoint paths join under it.
    pub base_url: Url,

    /// Sent as `chave` in every request body.
    pub api_key: String,

    /// Per-request timeout.
    /// Default: 15 seconds
    pub timeout: Duration,

    /// Extra attempts after a retryable failure.
    /// Default: 2
    pub max_retries: u32,

    /// First wait between attempts.
    /// Default: 250ms
    pub initial_backoff: Duration,

    /// Longest wait between attempts.
    /// Default: 5 seconds
    pub max_backoff: Duration,
}

impl GatewayConfig {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> GatewayResult<Self> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| GatewayError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        Ok(GatewayConfig {
            base_url,
            api_key: api_key.into(),
            timeout: Duration::from_secs(15),
            max_retries: 2,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
        })
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }

    /// Absolute URL of an endpoint path such as `clientes/rest_api/mbway/create`.
    pub fn endpoint(&self, path: &str) -> GatewayResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| GatewayError::InvalidUrl(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_under_base_path() {
        let config = GatewayConfig::new("https://example.test/sandbox", "k").unwrap();
        assert_eq!(
            config.endpoint("/clientes/rest_api/mbway/create").unwrap().as_str(),
            "https://example.test/sandbox/clientes/rest_api/mbway/create"
        );
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            GatewayConfig::new("not a url", "k"),
            Err(GatewayError::InvalidUrl(_))
        ));
    }
}
