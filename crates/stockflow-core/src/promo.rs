//! # Promo Code Rules
//!
//! The single validity rule for promo codes. The web client and the payment
//! flow both call [`validate_promo`]; there is no second copy to drift.
//!
//! ## Usable When
//! ```text
//! active
//!   AND (valid_from  is none OR now >= valid_from)
//!   AND (valid_until is none OR now <= valid_until)
//!   AND (max_uses    is none OR used_count < max_uses)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::discount::DiscountTerms;
use crate::error::ValidationError;
use crate::types::{PromoCode, PromoDuration, PromoType};
use crate::validation::{validate_promo_code_format, ValidationResult};
use crate::FULL_PERCENT_BPS;

/// Upper-cases and trims a code as typed by a user.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Why a code cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    NotFound,
    Inactive,
    NotYetValid,
    Expired,
    UsageLimitReached,
}

impl InvalidReason {
    pub const fn message(&self) -> &'static str {
        match self {
            InvalidReason::NotFound => "promo code not found",
            InvalidReason::Inactive => "promo code is no longer active",
            InvalidReason::NotYetValid => "promo code is not valid yet",
            InvalidReason::Expired => "promo code has expired",
            InvalidReason::UsageLimitReached => "promo code usage limit reached",
        }
    }
}

/// Result of validating a code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PromoValidation {
    Valid {
        code: String,
        #[serde(rename = "type")]
        promo_type: PromoType,
        value: i64,
        description: Option<String>,
        duration: PromoDuration,
    },
    Invalid {
        reason: InvalidReason,
    },
}

impl PromoValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, PromoValidation::Valid { .. })
    }

    /// Discount terms for a valid code.
    pub fn terms(&self) -> Option<DiscountTerms> {
        match self {
            PromoValidation::Valid {
                promo_type, value, ..
            } => Some(DiscountTerms::new(*promo_type, *value)),
            PromoValidation::Invalid { .. } => None,
        }
    }
}

/// Checks a looked-up promo against the clock and its usage cap.
///
/// `promo` is whatever the store returned for the normalized code.
pub fn validate_promo(promo: Option<&PromoCode>, now: DateTime<Utc>) -> PromoValidation {
    let invalid = |reason| PromoValidation::Invalid { reason };

    let Some(promo) = promo else {
        return invalid(InvalidReason::NotFound);
    };

    if !promo.active {
        return invalid(InvalidReason::Inactive);
    }
    if promo.valid_from.is_some_and(|from| now < from) {
        return invalid(InvalidReason::NotYetValid);
    }
    if promo.valid_until.is_some_and(|until| now > until) {
        return invalid(InvalidReason::Expired);
    }
    if promo.max_uses.is_some_and(|cap| promo.used_count >= cap) {
        return invalid(InvalidReason::UsageLimitReached);
    }

    PromoValidation::Valid {
        code: promo.code.clone(),
        promo_type: promo.promo_type,
        value: promo.value,
        description: promo.description.clone(),
        duration: promo.duration,
    }
}

/// Validates the fields of a promo being created.
///
/// ## Rules
/// - Code format (see `validate_promo_code_format`)
/// - `percentage`: 1..=10000 bps
/// - `fixed_amount`, `free_trial`: positive
/// - `repeating` needs `duration_months`
/// - `valid_from` before `valid_until`
pub fn validate_new_promo(
    code: &str,
    promo_type: PromoType,
    value: i64,
    duration: PromoDuration,
    duration_months: Option<u32>,
    valid_from: Option<DateTime<Utc>>,
    valid_until: Option<DateTime<Utc>>,
) -> ValidationResult<()> {
    validate_promo_code_format(code)?;

    match promo_type {
        PromoType::Percentage if !(1..=FULL_PERCENT_BPS).contains(&value) => {
            return Err(ValidationError::OutOfRange {
                field: "value".to_string(),
                min: 1,
                max: FULL_PERCENT_BPS,
            });
        }
        PromoType::FixedAmount | PromoType::FreeTrial if value <= 0 => {
            return Err(ValidationError::MustBePositive {
                field: "value".to_string(),
            });
        }
        _ => {}
    }

    if duration == PromoDuration::Repeating && duration_months.unwrap_or(0) == 0 {
        return Err(ValidationError::required("durationMonths"));
    }

    if let (Some(from), Some(until)) = (valid_from, valid_until) {
        if from > until {
            return Err(ValidationError::InvalidFormat {
                field: "validUntil".to_string(),
                reason: "must be after validFrom".to_string(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn promo() -> PromoCode {
        let now = Utc::now();
        PromoCode {
            id: "promo-1".to_string(),
            code: "SUMMER10".to_string(),
            promo_type: PromoType::Percentage,
            value: 1000,
            description: Some("10% off".to_string()),
            active: true,
            valid_from: None,
            valid_until: None,
            max_uses: None,
            used_count: 0,
            duration: PromoDuration::Once,
            duration_months: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  summer10 "), "SUMMER10");
    }

    #[test]
    fn test_valid_code() {
        let result = validate_promo(Some(&promo()), Utc::now());
        assert!(result.is_valid());
        assert_eq!(
            result.terms(),
            Some(DiscountTerms::new(PromoType::Percentage, 1000))
        );
    }

    #[test]
    fn test_missing_code() {
        assert_eq!(
            validate_promo(None, Utc::now()),
            PromoValidation::Invalid {
                reason: InvalidReason::NotFound
            }
        );
    }

    #[test]
    fn test_inactive_code_rejected() {
        let mut p = promo();
        p.active = false;
        assert_eq!(
            validate_promo(Some(&p), Utc::now()),
            PromoValidation::Invalid {
                reason: InvalidReason::Inactive
            }
        );
    }

    #[test]
    fn test_window_enforced() {
        let now = Utc::now();

        let mut early = promo();
        early.valid_from = Some(now + Duration::days(1));
        assert!(matches!(
            validate_promo(Some(&early), now),
            PromoValidation::Invalid { reason: InvalidReason::NotYetValid }
        ));

        let mut late = promo();
        late.valid_until = Some(now - Duration::seconds(1));
        assert!(matches!(
            validate_promo(Some(&late), now),
            PromoValidation::Invalid { reason: InvalidReason::Expired }
        ));

        let mut inside = promo();
        inside.valid_from = Some(now - Duration::days(1));
        inside.valid_until = Some(now + Duration::days(1));
        assert!(validate_promo(Some(&inside), now).is_valid());
    }

    #[test]
    fn test_usage_cap_enforced() {
        let mut p = promo();
        p.max_uses = Some(5);
        p.used_count = 4;
        assert!(validate_promo(Some(&p), Utc::now()).is_valid());

        p.used_count = 5;
        assert!(matches!(
            validate_promo(Some(&p), Utc::now()),
            PromoValidation::Invalid { reason: InvalidReason::UsageLimitReached }
        ));
    }

    #[test]
    fn test_validation_json_shape() {
        let json = serde_json::to_value(validate_promo(Some(&promo()), Utc::now())).unwrap();
        assert_eq!(json["status"], "valid");
        assert_eq!(json["type"], "percentage");
        assert_eq!(json["value"], 1000);

        let json = serde_json::to_value(validate_promo(None, Utc::now())).unwrap();
        assert_eq!(json["status"], "invalid");
        assert_eq!(json["reason"], "not_found");
    }

    #[test]
    fn test_validate_new_promo() {
        let ok = |t, v| validate_new_promo("WELCOME", t, v, PromoDuration::Once, None, None, None);
        assert!(ok(PromoType::Percentage, 1000).is_ok());
        assert!(ok(PromoType::Percentage, 0).is_err());
        assert!(ok(PromoType::Percentage, 10001).is_err());
        assert!(ok(PromoType::FixedAmount, 500).is_ok());
        assert!(ok(PromoType::FixedAmount, 0).is_err());
        assert!(ok(PromoType::FreeTrial, 14).is_ok());

        assert!(validate_new_promo(
            "LOYAL",
            PromoType::Percentage,
            500,
            PromoDuration::Repeating,
            None,
            None,
            None
        )
        .is_err());

        let now = Utc::now();
        assert!(validate_new_promo(
            "WINDOW",
            PromoType::Percentage,
            500,
            PromoDuration::Once,
            None,
            Some(now),
            Some(now - Duration::days(1))
        )
        .is_err());
    }
}
