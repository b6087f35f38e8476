//! Purchase order routes, including the price-confirmation protocol.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::services::purchase_orders::{self, CreatePurchaseOrderInput};
use crate::services::receiving::{self, ReceiveOutcome};
use crate::state::AppState;
use stockflow_core::purchasing::{PriceDecision, PriceDiff};
use stockflow_core::{PurchaseOrder, PurchaseOrderStatus};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<PurchaseOrderStatus>,
}

/// Body of the receive call. May be empty on the first attempt.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveBody {
    #[serde(default)]
    pub price_decision: Option<PriceDecision>,
}

/// 409 body when prices changed and no decision was sent.
#[derive(Debug, Serialize)]
pub struct ConfirmationRequired {
    pub status: &'static str,
    pub diffs: Vec<PriceDiff>,
}

#[derive(Debug, Serialize)]
pub struct PriceChanges {
    pub diffs: Vec<PriceDiff>,
}

pub async fn create(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
    Json(input): Json<CreatePurchaseOrderInput>,
) -> ApiResult<(StatusCode, Json<PurchaseOrder>)> {
    let order = purchase_orders::create_purchase_order(&state.db, &company_id, input, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<PurchaseOrder>>> {
    let orders = purchase_orders::list_purchase_orders(&state.db, &company_id, query.status).await?;
    Ok(Json(orders))
}

pub async fn get(
    State(state): State<AppState>,
    Path((company_id, order_id)): Path<(String, String)>,
) -> ApiResult<Json<PurchaseOrder>> {
    let order = purchase_orders::get_purchase_order(&state.db, &company_id, &order_id).await?;
    Ok(Json(order))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((company_id, order_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    purchase_orders::delete_purchase_order(&state.db, &company_id, &order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn cancel(
    State(state): State<AppState>,
    Path((company_id, order_id)): Path<(String, String)>,
) -> ApiResult<Json<PurchaseOrder>> {
    let order =
        purchase_orders::cancel_purchase_order(&state.db, &company_id, &order_id, Utc::now()).await?;
    Ok(Json(order))
}

pub async fn price_changes(
    State(state): State<AppState>,
    Path((company_id, order_id)): Path<(String, String)>,
) -> ApiResult<Json<PriceChanges>> {
    let diffs = receiving::check_price_changes(&state.db, &company_id, &order_id).await?;
    Ok(Json(PriceChanges { diffs }))
}

/// `POST .../receive`
///
/// ```text
/// {}                                   → 200 order | 409 confirmation_required
/// {"priceDecision": "update_prices"}   → 200 order, ledger updated
/// {"priceDecision": "keep_prices"}     → 200 order, ledger untouched
/// ```
pub async fn receive(
    State(state): State<AppState>,
    Path((company_id, order_id)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<Response> {
    let decision = if body.is_empty() {
        None
    } else {
        serde_json::from_slice::<ReceiveBody>(&body)
            .map_err(|e| ApiError::validation(format!("Invalid receive body: {}", e)))?
            .price_decision
    };
    let outcome =
        receiving::receive_purchase_order(&state.db, &company_id, &order_id, decision, Utc::now())
            .await?;

    Ok(match outcome {
        ReceiveOutcome::Received(order) => Json(order).into_response(),
        ReceiveOutcome::ConfirmationRequired(diffs) => (
            StatusCode::CONFLICT,
            Json(ConfirmationRequired {
                status: "confirmation_required",
                diffs,
            }),
        )
            .into_response(),
    })
}
