//! Promo code routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::services::promo::{self, CreatePromoInput, ValidatePromoResponse};
use crate::state::AppState;
use stockflow_core::PromoCode;

#[derive(Debug, Deserialize)]
pub struct ValidateBody {
    #[serde(default)]
    pub code: String,
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreatePromoInput>,
) -> ApiResult<(StatusCode, Json<PromoCode>)> {
    let created = promo::create_promo_code(&state.db, input, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Always 200 for a well-formed request; validity is in the body.
pub async fn validate(
    State(state): State<AppState>,
    Json(body): Json<ValidateBody>,
) -> ApiResult<Json<ValidatePromoResponse>> {
    let validation = promo::validate_promo_code(&state.db, &body.code, Utc::now()).await?;
    Ok(Json(validation.into()))
}

pub async fn deactivate(
    State(state): State<AppState>,
    Path(promo_id): Path<String>,
) -> ApiResult<Json<PromoCode>> {
    let promo = promo::deactivate_promo_code(&state.db, &promo_id, Utc::now()).await?;
    Ok(Json(promo))
}
