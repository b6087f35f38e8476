//! Promo code administration, validation and pricing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiResult;
use stockflow_core::discount::{calculate_discount, no_discount, DiscountResult};
use stockflow_core::promo::{normalize_code, validate_new_promo, validate_promo, PromoValidation};
use stockflow_core::validation::validate_required;
use stockflow_core::{CoreError, DiscountSnapshot, Money, PromoCode, PromoDuration, PromoType, ValidationError};
use stockflow_db::Database;

/// Body of `POST /promo-codes`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromoInput {
    pub code: String,
    #[serde(rename = "type")]
    pub promo_type: PromoType,
    /// Basis points, cents or days depending on `type`.
    pub value: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_uses: Option<i64>,
    #[serde(default)]
    pub duration: PromoDuration,
    #[serde(default)]
    pub duration_months: Option<u32>,
}

/// A promo applied to a price.
#[derive(Debug, Clone)]
pub struct PricedPromo {
    pub result: DiscountResult,
    /// `None` when no code was given.
    pub snapshot: Option<DiscountSnapshot>,
}

pub async fn validate_promo_code(
    db: &Database,
    code: &str,
    now: DateTime<Utc>,
) -> ApiResult<PromoValidation> {
    validate_required("code", code)?;
    let promo = db.promo_codes().find_by_code(code).await?;
    let validation = validate_promo(promo.as_ref(), now);
    debug!(code = %normalize_code(code), valid = validation.is_valid(), "Promo validated");
    Ok(validation)
}

pub async fn create_promo_code(
    db: &Database,
    input: CreatePromoInput,
    now: DateTime<Utc>,
) -> ApiResult<PromoCode> {
    let code = normalize_code(&input.code);
    validate_new_promo(
        &code,
        input.promo_type,
        input.value,
        input.duration,
        input.duration_months,
        input.valid_from,
        input.valid_until,
    )?;
    if input.max_uses.is_some_and(|max| max <= 0) {
        return Err(ValidationError::MustBePositive {
            field: "maxUses".to_string(),
        }
        .into());
    }

    let promo = PromoCode {
        id: Uuid::new_v4().to_string(),
        code,
        promo_type: input.promo_type,
        value: input.value,
        description: input.description,
        active: true,
        valid_from: input.valid_from,
        valid_until: input.valid_until,
        max_uses: input.max_uses,
        used_count: 0,
        duration: input.duration,
        duration_months: input.duration_months,
        created_at: now,
        updated_at: now,
    };

    db.promo_codes().insert(&promo).await?;
    Ok(promo)
}

/// Soft delete; the code stops validating but history keeps pointing at it.
pub async fn deactivate_promo_code(
    db: &Database,
    promo_id: &str,
    now: DateTime<Utc>,
) -> ApiResult<PromoCode> {
    let repo = db.promo_codes();
    repo.get_required(promo_id).await?;
    repo.deactivate(promo_id, now).await?;
    info!(promo_id, "Promo code deactivated");
    Ok(repo.get_required(promo_id).await?)
}

/// Prices `amount` under an optional promo code, re-validating the code.
///
/// ## Errors
/// - `ValidationError` when a code is given but cannot be used
pub async fn price_with_promo(
    db: &Database,
    amount: Money,
    code: Option<&str>,
    now: DateTime<Utc>,
) -> ApiResult<PricedPromo> {
    let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(PricedPromo {
            result: no_discount(amount),
            snapshot: None,
        });
    };

    let promo = db.promo_codes().find_by_code(code).await?;
    let validation = validate_promo(promo.as_ref(), now);

    let (promo, terms) = match (promo, validation.terms()) {
        (Some(promo), Some(terms)) => (promo, terms),
        _ => {
            let reason = match validation {
                PromoValidation::Invalid { reason } => reason.message().to_string(),
                PromoValidation::Valid { .. } => "promo code not found".to_string(),
            };
            return Err(CoreError::PromoCodeInvalid {
                code: normalize_code(code),
                reason,
            }
            .into());
        }
    };

    let result = calculate_discount(amount, &terms);
    debug!(
        code = %promo.code,
        original = %result.original_amount,
        discount = %result.discount,
        "Promo applied"
    );

    Ok(PricedPromo {
        result,
        snapshot: Some(DiscountSnapshot {
            promo_id: promo.id,
            code: promo.code,
            promo_type: promo.promo_type,
            value: promo.value,
            discount: result.discount,
            original_amount: result.original_amount,
            final_amount: result.final_amount,
        }),
    })
}

/// Response of `POST /promo-codes/validate`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatePromoResponse {
    pub valid: bool,
    #[serde(flatten)]
    pub validation: PromoValidation,
}

impl From<PromoValidation> for ValidatePromoResponse {
    fn from(validation: PromoValidation) -> Self {
        ValidatePromoResponse {
            valid: validation.is_valid(),
            validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::test_support::{database, now, promo};

    fn input(code: &str, promo_type: PromoType, value: i64) -> CreatePromoInput {
        CreatePromoInput {
            code: code.to_string(),
            promo_type,
            value,
            description: None,
            valid_from: None,
            valid_until: None,
            max_uses: None,
            duration: PromoDuration::Once,
            duration_months: None,
        }
    }

    #[tokio::test]
    async fn test_create_normalizes_and_rejects_duplicates() {
        let db = database().await;
        let created = create_promo_code(&db, input(" summer10 ", PromoType::Percentage, 1000), now())
            .await
            .unwrap();
        assert_eq!(created.code, "SUMMER10");

        let err = create_promo_code(&db, input("SUMMER10", PromoType::Percentage, 500), now())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_values() {
        let db = database().await;
        let err = create_promo_code(&db, input("BIG", PromoType::Percentage, 20_000), now())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut capped = input("CAPPED", PromoType::FixedAmount, 500);
        capped.max_uses = Some(0);
        let err = create_promo_code(&db, capped, now()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_validate_and_deactivate() {
        let db = database().await;
        let created = create_promo_code(&db, input("WELCOME5", PromoType::FixedAmount, 500), now())
            .await
            .unwrap();

        let validation = validate_promo_code(&db, "welcome5", now()).await.unwrap();
        assert!(validation.is_valid());

        let deactivated = deactivate_promo_code(&db, &created.id, now()).await.unwrap();
        assert!(!deactivated.active);

        let validation = validate_promo_code(&db, "WELCOME5", now()).await.unwrap();
        assert!(!validation.is_valid());

        let err = validate_promo_code(&db, "  ", now()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_price_with_promo() {
        let db = database().await;
        db.promo_codes()
            .insert(&promo("SUMMER10", PromoType::Percentage, 1000))
            .await
            .unwrap();

        let priced = price_with_promo(&db, Money::from_cents(2990), Some("summer10"), now())
            .await
            .unwrap();
        assert_eq!(priced.result.discount, Money::from_cents(299));
        assert_eq!(priced.result.final_amount, Money::from_cents(2691));
        let snapshot = priced.snapshot.unwrap();
        assert_eq!(snapshot.promo_id, "promo-summer10");
        assert_eq!(snapshot.code, "SUMMER10");

        let plain = price_with_promo(&db, Money::from_cents(2990), None, now())
            .await
            .unwrap();
        assert_eq!(plain.result.final_amount, Money::from_cents(2990));
        assert!(plain.snapshot.is_none());

        let err = price_with_promo(&db, Money::from_cents(2990), Some("NOPE"), now())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_validate_response_shape() {
        let response = ValidatePromoResponse::from(PromoValidation::Invalid {
            reason: stockflow_core::promo::InvalidReason::Expired,
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["status"], "invalid");
        assert_eq!(json["reason"], "expired");
    }
}
