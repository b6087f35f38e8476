//! Supplier price ledger routes.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::services::supplier_prices::{self, SupplierPriceView};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferredSupplierBody {
    pub supplier_id: String,
}

pub async fn list(
    State(state): State<AppState>,
    Path((company_id, product_id)): Path<(String, String)>,
) -> ApiResult<Json<Vec<SupplierPriceView>>> {
    let ledgers = supplier_prices::list_supplier_prices(&state.db, &company_id, &product_id).await?;
    Ok(Json(ledgers))
}

pub async fn set_preferred(
    State(state): State<AppState>,
    Path((company_id, product_id)): Path<(String, String)>,
    Json(body): Json<PreferredSupplierBody>,
) -> ApiResult<Json<Vec<SupplierPriceView>>> {
    let ledgers = supplier_prices::set_preferred_supplier(
        &state.db,
        &company_id,
        &product_id,
        &body.supplier_id,
        Utc::now(),
    )
    .await?;
    Ok(Json(ledgers))
}
