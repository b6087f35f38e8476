//! # Stockflow API
//!
//! HTTP surface over purchase-order receiving, promo codes and EuPago
//! subscription billing.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Stockflow API                                   │
//! │                                                                         │
//! │  client / EuPago ───► axum router (routes) ───► services                │
//! │                                                    │                    │
//! │                          ┌─────────────────────────┼──────────────┐     │
//! │                          ▼                         ▼              ▼     │
//! │                   stockflow-core            stockflow-db   stockflow-   │
//! │                   (pure rules)              (SQLite docs)  gateway      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `STOCKFLOW_PORT` - HTTP port (default: 8080)
//! - `STOCKFLOW_BIND_ADDR` - Interface (default: 0.0.0.0)
//! - `STOCKFLOW_DATABASE_PATH` - SQLite file (default: ./stockflow.db)
//! - `STOCKFLOW_DB_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `EUPAGO_BASE_URL` - Gateway base URL
//! - `EUPAGO_API_KEY` - Gateway key (required)
//! - `EUPAGO_WEBHOOK_SECRET` - Webhook HMAC secret (required)
//! - `EUPAGO_TIMEOUT_SECS`, `EUPAGO_MAX_RETRIES`, `EUPAGO_INITIAL_BACKOFF_MS`
//! - `RUST_LOG` - Log filter (default: `info,stockflow=debug`)

pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports
pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::router;
pub use state::AppState;
