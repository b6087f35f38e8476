//! # Gateway Error Types
//!
//! ```text
//! reqwest::Error ──┬── timeout        → Timeout     (not retried)
//!                  ├── connect        → Connect     (retried)
//!                  └── other          → Transport   (not retried)
//! HTTP 502/503/504                    → Status      (retried)
//! other non-2xx                       → Status      (not retried)
//! body not the expected JSON          → Decode      (not retried)
//! ```
//!
//! A timed-out create may still have reached the gateway, so it is never
//! replayed; the payment is marked failed and the user retries.

use thiserror::Error;

/// Errors talking to the payment gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Base URL could not be parsed.
    #[error("Invalid gateway URL: {0}")]
    InvalidUrl(String),

    /// The gateway did not answer within the configured timeout.
    #[error("Gateway request timed out")]
    Timeout,

    /// Could not connect to the gateway.
    #[error("Could not connect to gateway: {0}")]
    Connect(String),

    /// Any other transport-level failure.
    #[error("Gateway transport error: {0}")]
    Transport(String),

    /// The gateway answered with a non-success HTTP status.
    #[error("Gateway returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The gateway answered with a body we could not decode.
    #[error("Unexpected gateway response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Whether another attempt is worth making. Retries of a create rely on
    /// the gateway deduplicating on the client reference.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Connect(_) => true,
            GatewayError::Status { status, .. } => matches!(status, 502..=504),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else if err.is_connect() {
            GatewayError::Connect(err.to_string())
        } else if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
