//! Payment routes.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;

use crate::error::ApiResult;
use crate::services::payment::{self, CreatePaymentInput, PaymentCreated};
use crate::state::AppState;
use stockflow_core::Payment;

pub async fn create_mbway(
    State(state): State<AppState>,
    Json(input): Json<CreatePaymentInput>,
) -> ApiResult<Json<PaymentCreated>> {
    Ok(Json(payment::create_mbway_payment(&state, input, Utc::now()).await?))
}

pub async fn create_multibanco(
    State(state): State<AppState>,
    Json(input): Json<CreatePaymentInput>,
) -> ApiResult<Json<PaymentCreated>> {
    Ok(Json(payment::create_multibanco_payment(&state, input, Utc::now()).await?))
}

/// Client polling while the customer approves the payment.
pub async fn get(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> ApiResult<Json<Payment>> {
    Ok(Json(payment::get_payment(&state.db, &payment_id).await?))
}
