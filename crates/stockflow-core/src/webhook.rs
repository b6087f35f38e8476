//! # Webhook Rules
//!
//! Signature verification, status vocabulary and the payment state machine
//! for gateway callbacks.
//!
//! ## Payment State Machine
//! ```text
//!              ┌──────────► paid    (terminal)
//!   pending ───┤
//!              └──────────► failed  (terminal)
//!
//!   paid   + "paid"   → duplicate (no-op, subscription untouched)
//!   paid   + "failed" → ignored   (never regress a terminal state)
//!   any    + unknown  → unchanged
//! ```

use hmac::{Hmac, Mac};
use serde::{Deserialize, Deserializer, Serialize};
use sha2::Sha256;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::PaymentStatus;

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// Signatures
// =============================================================================

fn mac(secret: &[u8], body: &[u8]) -> CoreResult<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| CoreError::InvalidSignature)?;
    mac.update(body);
    Ok(mac)
}

/// Hex HMAC-SHA256 of `body` under `secret`.
pub fn sign_payload(secret: &[u8], body: &[u8]) -> CoreResult<String> {
    Ok(hex::encode(mac(secret, body)?.finalize().into_bytes()))
}

/// Verifies the signature header against the raw body in constant time.
///
/// ## Errors
/// `InvalidSignature` when the header is missing, not hex, or wrong.
pub fn verify_signature(secret: &[u8], body: &[u8], signature: Option<&str>) -> CoreResult<()> {
    let signature = signature
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(CoreError::InvalidSignature)?;
    let expected = hex::decode(signature).map_err(|_| CoreError::InvalidSignature)?;

    mac(secret, body)?
        .verify_slice(&expected)
        .map_err(|_| CoreError::InvalidSignature)
}

// =============================================================================
// Notification Body
// =============================================================================

/// Inbound callback body. The gateway sends ids and amounts either as
/// strings or as numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookNotification {
    /// The gateway's payment id.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "estado")]
    pub status: String,
    #[serde(rename = "referencia", default, deserialize_with = "optional_string")]
    pub reference: Option<String>,
    /// Amount as sent. Informational only, so a format we cannot read never
    /// rejects the callback; see [`WebhookNotification::amount`].
    #[serde(rename = "valor", default, deserialize_with = "optional_string")]
    pub raw_amount: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
}

impl WebhookNotification {
    /// Parses a raw body.
    pub fn parse(body: &[u8]) -> CoreResult<Self> {
        serde_json::from_slice(body).map_err(|e| {
            CoreError::Validation(crate::ValidationError::InvalidFormat {
                field: "body".to_string(),
                reason: e.to_string(),
            })
        })
    }

    /// Reported amount, `None` when absent or not a plain decimal.
    pub fn amount(&self) -> Option<Money> {
        self.raw_amount
            .as_deref()
            .and_then(|raw| Money::parse_decimal(raw).ok())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Number(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Scalar::deserialize(deserializer)?.into_string())
}

fn optional_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_string))
}

// =============================================================================
// Status Mapping
// =============================================================================

/// Maps the gateway's status vocabulary to ours.
///
/// `None` means "not final yet": the payment stays pending.
pub fn map_gateway_status(status: &str) -> Option<PaymentStatus> {
    match status.trim().to_ascii_lowercase().as_str() {
        "ok" | "success" | "paid" => Some(PaymentStatus::Paid),
        "failed" | "error" => Some(PaymentStatus::Failed),
        _ => None,
    }
}

/// What a notification does to a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// pending → terminal; write it.
    Apply(PaymentStatus),
    /// Same terminal status re-delivered.
    Duplicate,
    /// Status the gateway reports is not final.
    Unchanged,
    /// Terminal payment told a different terminal status.
    IgnoredRegression,
}

/// Decides the transition for an incoming notification.
pub fn plan_transition(current: PaymentStatus, incoming: Option<PaymentStatus>) -> TransitionOutcome {
    match (current, incoming) {
        (_, None) | (_, Some(PaymentStatus::Pending)) => TransitionOutcome::Unchanged,
        (PaymentStatus::Pending, Some(next)) => TransitionOutcome::Apply(next),
        (current, Some(next)) if current == next => TransitionOutcome::Duplicate,
        _ => TransitionOutcome::IgnoredRegression,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
