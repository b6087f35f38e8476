//! # EuPago Client
//!
//! ## Request Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_mbway / create_multibanco                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  POST {base}/clientes/rest_api/{mbway|multibanco}/create                │
//! │       │                                                                 │
//! │       ├── 2xx ─────────────► decode → Accepted | Rejected               │
//! │       ├── timeout ─────────► Timeout (give up: may have been created)   │
//! │       ├── connect / 502-504 ► wait (exponential backoff), try again     │
//! │       │                       up to max_retries times, same `id`        │
//! │       └── other ───────────► error                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::types::{
    GatewayOutcome, GatewayReply, PushBody, PushPaymentRequest, VoucherBody, VoucherPaymentRequest,
};

const MBWAY_PATH: &str = "clientes/rest_api/mbway/create";
const MULTIBANCO_PATH: &str = "clientes/rest_api/multibanco/create";

/// HTTP client for the payment gateway. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EupagoClient {
    http: reqwest::Client,
    config: Arc<GatewayConfig>,
}

impl EupagoClient {
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(EupagoClient {
            http,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Creates an MB WAY push payment.
    pub async fn create_mbway(&self, request: &PushPaymentRequest) -> GatewayResult<GatewayReply> {
        let body = PushBody {
            chave: &self.config.api_key,
            valor: request.amount.to_decimal_string(),
            id: &request.client_reference,
            alias: &request.phone,
            descricao: &request.description,
        };
        self.post(MBWAY_PATH, &request.client_reference, &body).await
    }

    /// Creates a Multibanco voucher.
    pub async fn create_multibanco(&self, request: &VoucherPaymentRequest) -> GatewayResult<GatewayReply> {
        let body = VoucherBody {
            chave: &self.config.api_key,
            valor: request.amount.to_decimal_string(),
            id: &request.client_reference,
            descricao: &request.description,
        };
        self.post(MULTIBANCO_PATH, &request.client_reference, &body).await
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.config.initial_backoff,
            max_interval: self.config.max_backoff,
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        }
    }

    /// Sends a create call, retrying transient failures.
    ///
    /// Creates are not idempotent on our side: a 502-504 may come back after
    /// the gateway already created the payment. Every attempt carries the
    /// same `id` (our payment id) and the gateway deduplicates on it, so a
    /// retry cannot push a second request to the payer's phone.
    async fn post<B: Serialize>(&self, path: &str, reference: &str, body: &B) -> GatewayResult<GatewayReply> {
        let url = self.config.endpoint(path)?;
        let mut backoff = self.backoff();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            debug!(%url, reference, attempt, "Calling gateway");

            match self.send_once(url.clone(), body).await {
                Ok(reply) => {
                    match &reply.outcome {
                        GatewayOutcome::Accepted { id, .. } => {
                            info!(reference, gateway_id = %id, "Gateway accepted payment")
                        }
                        GatewayOutcome::Rejected { message } => {
                            warn!(reference, %message, "Gateway rejected payment")
                        }
                    }
                    return Ok(reply);
                }
                Err(err) if err.is_retryable() && attempt <= self.config.max_retries => {
                    let wait = backoff.next_backoff().unwrap_or(self.config.max_backoff);
                    warn!(reference, attempt, ?wait, error = %err, "Gateway call failed, retrying");
                    tokio::time::sleep(wait).await;
                }
                Err(err) => {
                    warn!(reference, attempt, error = %err, "Gateway call failed");
                    return Err(err);
                }
            }
        }
    }

    async fn send_once<B: Serialize>(&self, url: url::Url, body: &B) -> GatewayResult<GatewayReply> {
        let response = self.http.post(url).json(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let raw: Value = response.json().await?;
        GatewayReply::decode(raw)
    }
}

// =============================================================================
// Tests
// =============================================================================
