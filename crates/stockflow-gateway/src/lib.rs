//! # stockflow-gateway: EuPago Payment Gateway Client
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  apps/api payment service                                              │
//! │       │  PushPaymentRequest / VoucherPaymentRequest                    │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               stockflow-gateway (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   EupagoClient ──► reqwest (timeout) ──► backoff on 502-504     │   │
//! │  │        │                                                        │   │
//! │  │        ▼                                                        │   │
//! │  │   GatewayReply { outcome: Accepted | Rejected, raw }            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │  HTTPS                                                          │
//! │       ▼                                                                 │
//! │  EuPago REST API                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Inbound webhooks are not handled here: their signature and status rules
//! are pure and live in `stockflow_core::webhook`.

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::EupagoClient;
pub use config::{GatewayConfig, DEFAULT_BASE_URL};
pub use error::{GatewayError, GatewayResult};
pub use types::{GatewayOutcome, GatewayReply, PushPaymentRequest, VoucherPaymentRequest};
