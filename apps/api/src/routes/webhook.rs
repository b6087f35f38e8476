//! EuPago callback route.
//!
//! The body is taken as raw bytes: the signature covers the exact bytes
//! the gateway sent, so it must be checked before any JSON parsing.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;

use crate::error::ApiResult;
use crate::services::webhook::{self, WebhookAck};
use crate::state::AppState;
use stockflow_core::SIGNATURE_HEADER;

pub async fn eupago(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookAck>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let ack = webhook::handle_gateway_webhook(
        &state.db,
        state.webhook_secret(),
        &body,
        signature,
        Utc::now(),
    )
    .await?;
    Ok(Json(ack))
}
