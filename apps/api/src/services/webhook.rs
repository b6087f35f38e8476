//! # Webhook Reconciliation
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /webhooks/eupago   (at-least-once, possibly concurrent)           │
//! │                                                                         │
//! │  HMAC check ──✗──► 401, nothing read or written                         │
//! │      │                                                                  │
//! │  parse body ──► payment by gateway id ──✗──► 404                        │
//! │      │                                                                  │
//! │  map estado ──► plan_transition(current, incoming)                      │
//! │      ├── Apply      CAS pending → paid/failed (payload, paidAt)         │
//! │      │                 └── paid ──► finalize_paid                        │
//! │      ├── Duplicate  paid but not activated yet ──► finalize_paid        │
//! │      ├── Unchanged  not a final status                                  │
//! │      └── Ignored    terminal payment told something else                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::services::subscription::finalize_paid;
use stockflow_core::webhook::{
    map_gateway_status, plan_transition, verify_signature, TransitionOutcome, WebhookNotification,
};
use stockflow_core::{Payment, PaymentStatus};
use stockflow_db::Database;

/// What a notification did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookOutcome {
    Applied,
    Duplicate,
    Unchanged,
    Ignored,
}

/// Body returned to the gateway.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    pub received: bool,
    pub payment_id: String,
    pub status: PaymentStatus,
    pub outcome: WebhookOutcome,
}

pub async fn handle_gateway_webhook(
    db: &Database,
    secret: &[u8],
    body: &[u8],
    signature: Option<&str>,
    now: DateTime<Utc>,
) -> ApiResult<WebhookAck> {
    if let Err(err) = verify_signature(secret, body, signature) {
        warn!(has_signature = signature.is_some(), "Webhook signature rejected");
        return Err(err.into());
    }

    let notification = WebhookNotification::parse(body)?;
    let payment = db
        .payments()
        .find_by_gateway_id(&notification.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Payment", &notification.id))?;

    let incoming = map_gateway_status(&notification.status);
    let reported = notification.amount();
    if reported.is_none() && notification.raw_amount.is_some() {
        warn!(
            payment_id = %payment.id,
            valor = ?notification.raw_amount,
            "Unreadable amount in webhook"
        );
    }
    debug!(
        payment_id = %payment.id,
        estado = %notification.status,
        current = %payment.status,
        reported = ?reported,
        expected = %payment.amount,
        "Webhook received"
    );

    let outcome = match plan_transition(payment.status, incoming) {
        TransitionOutcome::Apply(next) => {
            let raw: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
            apply(db, &payment, next, raw, now).await?
        }
        TransitionOutcome::Duplicate => {
            if payment.status == PaymentStatus::Paid && payment.subscription_activated_at.is_none() {
                // A previous delivery marked it paid but did not get to activate
                finalize_paid(db, &payment, now).await?;
            }
            WebhookOutcome::Duplicate
        }
        TransitionOutcome::Unchanged => WebhookOutcome::Unchanged,
        TransitionOutcome::IgnoredRegression => {
            warn!(
                payment_id = %payment.id,
                current = %payment.status,
                estado = %notification.status,
                "Ignoring status change on a settled payment"
            );
            WebhookOutcome::Ignored
        }
    };

    let status = db.payments().get_required(&payment.id).await?.status;
    Ok(WebhookAck {
        received: true,
        payment_id: payment.id,
        status,
        outcome,
    })
}

async fn apply(
    db: &Database,
    payment: &Payment,
    next: PaymentStatus,
    raw: Value,
    now: DateTime<Utc>,
) -> ApiResult<WebhookOutcome> {
    let mut patch = json!({
        "status": next,
        "webhookPayload": raw,
        "updatedAt": now,
    });
    match next {
        PaymentStatus::Paid => patch["paidAt"] = json!(now),
        PaymentStatus::Failed => {
            patch["failureReason"] = json!("Payment refused or expired at gateway");
        }
        PaymentStatus::Pending => {}
    }

    if !db
        .payments()
        .transition(&payment.id, PaymentStatus::Pending, &patch)
        .await?
    {
        // Lost the race to a concurrent delivery
        debug!(payment_id = %payment.id, "Payment already moved by another delivery");
        return Ok(WebhookOutcome::Duplicate);
    }

    info!(payment_id = %payment.id, status = %next, "Payment status updated");

    if next == PaymentStatus::Paid {
        let paid = db.payments().get_required(&payment.id).await?;
        finalize_paid(db, &paid, now).await?;
    }
    Ok(WebhookOutcome::Applied)
}
