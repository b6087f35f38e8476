//! # Payment Creation
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_mbway_payment / create_multibanco_payment                       │
//! │                                                                         │
//! │  validate input ──► user exists ──► re-price with promo (server wins)   │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  Payment { status: pending, amount: final, originalAmount, discount }   │
//! │        │                                                                │
//! │        ├── final == 0 ──► paid, subscription activated, no gateway      │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  EuPago create (client reference = payment id)                          │
//! │        ├── accepted ──► reference, gateway id, entity stored            │
//! │        └── rejected / unreachable ──► payment failed, 502               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::services::promo::price_with_promo;
use crate::services::subscription::finalize_paid;
use crate::state::AppState;
use stockflow_core::validation::{
    format_voucher_reference, normalize_phone, require_present, validate_payment_amount,
    validate_push_phone,
};
use stockflow_core::{Money, Payment, PaymentMethod, PaymentStatus, ValidationError};
use stockflow_db::Database;
use stockflow_gateway::{GatewayOutcome, PushPaymentRequest, VoucherPaymentRequest};

/// Body of `POST /payments/mbway` and `POST /payments/multibanco`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentInput {
    /// Plan price in cents, before any promo.
    #[serde(default)]
    pub amount: Option<Money>,
    /// MB WAY only.
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub plan_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub promo_code: Option<String>,
}

/// Response of a successful payment creation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCreated {
    pub success: bool,
    pub payment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Voucher reference grouped for display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_display: Option<String>,
    pub amount: Money,
    pub original_amount: Money,
    pub discount_applied: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    pub status: PaymentStatus,
}

impl PaymentCreated {
    fn from_payment(payment: &Payment) -> Self {
        let reference_display = match payment.method {
            PaymentMethod::Multibanco => payment
                .gateway_reference
                .as_deref()
                .map(format_voucher_reference),
            PaymentMethod::Mbway => None,
        };

        PaymentCreated {
            success: true,
            payment_id: payment.id.clone(),
            reference: payment.gateway_reference.clone(),
            reference_display,
            amount: payment.amount,
            original_amount: payment.original_amount,
            discount_applied: payment.original_amount - payment.amount,
            entity: payment.entity.clone(),
            status: payment.status,
        }
    }
}

/// MB WAY push payment. The phone is normalized to 9 digits and checked
/// before anything is written.
pub async fn create_mbway_payment(
    state: &AppState,
    input: CreatePaymentInput,
    now: DateTime<Utc>,
) -> ApiResult<PaymentCreated> {
    let phone = normalize_phone(require_present("phone", input.phone.as_deref())?);
    validate_push_phone(&phone)?;
    create_payment(state, PaymentMethod::Mbway, Some(phone), input, now).await
}

/// Multibanco voucher payment.
pub async fn create_multibanco_payment(
    state: &AppState,
    input: CreatePaymentInput,
    now: DateTime<Utc>,
) -> ApiResult<PaymentCreated> {
    create_payment(state, PaymentMethod::Multibanco, None, input, now).await
}

pub async fn get_payment(db: &Database, payment_id: &str) -> ApiResult<Payment> {
    Ok(db.payments().get_required(payment_id).await?)
}

async fn create_payment(
    state: &AppState,
    method: PaymentMethod,
    phone: Option<String>,
    input: CreatePaymentInput,
    now: DateTime<Utc>,
) -> ApiResult<PaymentCreated> {
    let db = &state.db;

    let amount = input.amount.ok_or_else(|| ValidationError::required("amount"))?;
    validate_payment_amount(amount)?;
    let plan_id = require_present("planId", input.plan_id.as_deref())?.trim().to_string();
    let user_id = require_present("userId", input.user_id.as_deref())?.trim().to_string();

    let user = db.users().get_required(&user_id).await?;
    let priced = price_with_promo(db, amount, input.promo_code.as_deref(), now).await?;

    let mut payment = Payment {
        id: Uuid::new_v4().to_string(),
        user_id: user.id,
        company_id: user.company_id,
        plan_id,
        method,
        amount: priced.result.final_amount,
        original_amount: amount,
        discount: priced.snapshot,
        status: PaymentStatus::Pending,
        phone,
        gateway_reference: None,
        gateway_id: None,
        entity: None,
        gateway_payload: None,
        webhook_payload: None,
        failure_reason: None,
        paid_at: None,
        subscription_activated_at: None,
        created_at: now,
        updated_at: now,
    };
    db.payments().insert(&payment).await?;

    if payment.amount.is_zero() {
        return settle_without_gateway(db, payment, now).await;
    }

    let description = format!("Stockflow {}", payment.plan_id);
    let reply = match method {
        PaymentMethod::Mbway => {
            let request = PushPaymentRequest {
                amount: payment.amount,
                client_reference: payment.id.clone(),
                phone: payment.phone.clone().unwrap_or_default(),
                description,
            };
            state.gateway.create_mbway(&request).await
        }
        PaymentMethod::Multibanco => {
            let request = VoucherPaymentRequest {
                amount: payment.amount,
                client_reference: payment.id.clone(),
                description,
            };
            state.gateway.create_multibanco(&request).await
        }
    };

    let reply = match reply {
        Ok(reply) => reply,
        Err(err) => {
            fail_payment(db, &payment.id, &err.to_string(), None, now).await?;
            return Err(err.into());
        }
    };

    match reply.outcome {
        GatewayOutcome::Accepted {
            reference,
            id,
            entity,
        } => {
            db.payments()
                .merge(
                    &payment.id,
                    &json!({
                        "gatewayReference": reference,
                        "gatewayId": id,
                        "entity": entity,
                        "gatewayPayload": reply.raw,
                        "updatedAt": now,
                    }),
                )
                .await?;

            payment.gateway_reference = Some(reference);
            payment.gateway_id = Some(id);
            payment.entity = entity;

            info!(
                payment_id = %payment.id,
                method = %method,
                amount = %payment.amount,
                gateway_id = ?payment.gateway_id,
                "Payment created"
            );
            Ok(PaymentCreated::from_payment(&payment))
        }
        GatewayOutcome::Rejected { message } => {
            fail_payment(db, &payment.id, &message, Some(reply.raw), now).await?;
            Err(ApiError::payment(message))
        }
    }
}

/// Fully discounted payments skip the gateway and are paid on creation.
async fn settle_without_gateway(
    db: &Database,
    payment: Payment,
    now: DateTime<Utc>,
) -> ApiResult<PaymentCreated> {
    let patch = json!({
        "status": PaymentStatus::Paid,
        "paidAt": now,
        "updatedAt": now,
    });
    if !db.payments().transition(&payment.id, PaymentStatus::Pending, &patch).await? {
        return Err(ApiError::conflict(format!(
            "Payment {} changed while settling",
            payment.id
        )));
    }

    let payment = db.payments().get_required(&payment.id).await?;
    finalize_paid(db, &payment, now).await?;

    info!(payment_id = %payment.id, "Payment settled without gateway");
    Ok(PaymentCreated::from_payment(&payment))
}

/// Keeps the record, marked failed with the gateway's message.
async fn fail_payment(
    db: &Database,
    payment_id: &str,
    reason: &str,
    raw: Option<Value>,
    now: DateTime<Utc>,
) -> ApiResult<()> {
    let mut patch = json!({
        "status": PaymentStatus::Failed,
        "failureReason": reason,
        "updatedAt": now,
    });
    if let Some(raw) = raw {
        patch["gatewayPayload"] = raw;
    }

    db.payments()
        .transition(payment_id, PaymentStatus::Pending, &patch)
        .await?;
    warn!(payment_id, reason, "Payment failed at gateway");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::test_support::{app_state, now, promo, seed_user};
    use stockflow_core::PromoType;
    use stockflow_db::collections::PAYMENTS;
    use stockflow_db::Filter;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MBWAY_PATH: &str = "/clientes/rest_api/mbway/create";
    const MULTIBANCO_PATH: &str = "/clientes/rest_api/multibanco/create";

    fn input(amount: i64, phone: Option<&str>, promo_code: Option<&str>) -> CreatePaymentInput {
        CreatePaymentInput {
            amount: Some(Money::from_cents(amount)),
            phone: phone.map(str::to_string),
            plan_id: Some("pro".to_string()),
            user_id: Some("u-1".to_string()),
            promo_code: promo_code.map(str::to_string),
        }
    }

    async fn payments_with_status(state: &AppState, status: PaymentStatus) -> Vec<Payment> {
        state
            .db
            .documents()
            .query(PAYMENTS, &[Filter::eq("status", status.as_str())])
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_mbway_accepted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MBWAY_PATH))
            .and(body_partial_json(json!({"valor": "29.90", "alias": "912345678"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "estado": "ok",
                "referencia": "7712345",
                "id": "eu-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let state = app_state(&server.uri()).await;
        seed_user(&state.db, "u-1", None).await;

        let created = create_mbway_payment(&state, input(2990, Some("+351 912 345 678"), None), now())
            .await
            .unwrap();
        assert!(created.success);
        assert_eq!(created.reference.as_deref(), Some("7712345"));
        assert!(created.reference_display.is_none());
        assert_eq!(created.status, PaymentStatus::Pending);

        let stored = get_payment(&state.db, &created.payment_id).await.unwrap();
        assert_eq!(stored.gateway_id.as_deref(), Some("eu-1"));
        assert_eq!(stored.phone.as_deref(), Some("912345678"));
        assert!(stored.gateway_payload.is_some());
    }

    #[tokio::test]
    async fn test_multibanco_with_promo() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MULTIBANCO_PATH))
            .and(body_partial_json(json!({"valor": "26.91"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "estado": "ok",
                "referencia": "123456789",
                "entidade": "11249",
                "id": "eu-2"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let state = app_state(&server.uri()).await;
        seed_user(&state.db, "u-1", None).await;
        state
            .db
            .promo_codes()
            .insert(&promo("SUMMER10", PromoType::Percentage, 1000))
            .await
            .unwrap();

        let created = create_multibanco_payment(&state, input(2990, None, Some("summer10")), now())
            .await
            .unwrap();
        assert_eq!(created.amount, Money::from_cents(2691));
        assert_eq!(created.original_amount, Money::from_cents(2990));
        assert_eq!(created.discount_applied, Money::from_cents(299));
        assert_eq!(created.entity.as_deref(), Some("11249"));
        assert_eq!(created.reference_display.as_deref(), Some("123 456 789"));

        // Redemption waits for the payment to be paid
        let promo = state.db.promo_codes().get_required("promo-summer10").await.unwrap();
        assert_eq!(promo.used_count, 0);
    }

    #[tokio::test]
    async fn test_rejection_keeps_failed_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "estado": "erro",
                "mensagem": "Alias inexistente"
            })))
            .mount(&server)
            .await;

        let state = app_state(&server.uri()).await;
        seed_user(&state.db, "u-1", None).await;

        let err = create_mbway_payment(&state, input(2990, Some("912345678"), None), now())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentError);
        assert_eq!(err.message, "Alias inexistente");

        let failed = payments_with_status(&state, PaymentStatus::Failed).await;
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].failure_reason.as_deref(), Some("Alias inexistente"));
    }

    #[tokio::test]
    async fn test_gateway_unreachable_fails_payment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let state = app_state(&server.uri()).await;
        seed_user(&state.db, "u-1", None).await;

        let err = create_multibanco_payment(&state, input(2990, None, None), now())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentError);
        assert_eq!(payments_with_status(&state, PaymentStatus::Failed).await.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let state = app_state(&server.uri()).await;
        seed_user(&state.db, "u-1", None).await;

        let err = create_mbway_payment(&state, input(2990, Some("212345678"), None), now())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = create_mbway_payment(&state, input(2990, None, None), now())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = create_multibanco_payment(&state, input(0, None, None), now())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut no_plan = input(2990, None, None);
        no_plan.plan_id = None;
        let err = create_multibanco_payment(&state, no_plan, now()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = create_multibanco_payment(&state, input(2990, None, Some("NOPE")), now())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut stranger = input(2990, None, None);
        stranger.user_id = Some("u-404".to_string());
        let err = create_multibanco_payment(&state, stranger, now()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        assert!(payments_with_status(&state, PaymentStatus::Pending).await.is_empty());
    }

    #[tokio::test]
    async fn test_free_trial_is_paid_without_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let state = app_state(&server.uri()).await;
        seed_user(&state.db, "u-1", None).await;
        state
            .db
            .promo_codes()
            .insert(&promo("TRIAL30", PromoType::FreeTrial, 30))
            .await
            .unwrap();

        let created = create_multibanco_payment(&state, input(2990, None, Some("TRIAL30")), now())
            .await
            .unwrap();
        assert_eq!(created.status, PaymentStatus::Paid);
        assert!(created.amount.is_zero());
        assert_eq!(created.discount_applied, Money::from_cents(2990));

        let payment = get_payment(&state.db, &created.payment_id).await.unwrap();
        assert!(payment.paid_at.is_some());
        assert!(payment.company_id.is_some());

        let promo = state.db.promo_codes().get_required("promo-trial30").await.unwrap();
        assert_eq!(promo.used_count, 1);
    }
}
