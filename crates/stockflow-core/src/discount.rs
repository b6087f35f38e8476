//! # Discount Calculator
//!
//! One deterministic function that turns an amount and a promo into the
//! charge. The web client calls it for display (compiled to WASM), the API
//! calls it for the authoritative charge; both get identical integers.
//!
//! ## Rules
//! ```text
//! ┌──────────────┬────────────────────────────────────────────────────────┐
//! │ percentage   │ discount = amount × value / 10000 (bps, half up)       │
//! │ fixed_amount │ discount = min(amount, value)                          │
//! │ free_trial   │ discount = amount (nothing charged for the trial)      │
//! ├──────────────┴────────────────────────────────────────────────────────┤
//! │ final = max(0, amount − discount)                                     │
//! └───────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{PromoCode, PromoType};
use crate::FULL_PERCENT_BPS;

/// The part of a promo the calculator needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscountTerms {
    pub promo_type: PromoType,
    /// Basis points, cents or days depending on `promo_type`.
    pub value: i64,
}

impl DiscountTerms {
    pub const fn new(promo_type: PromoType, value: i64) -> Self {
        Self { promo_type, value }
    }
}

impl From<&PromoCode> for DiscountTerms {
    fn from(promo: &PromoCode) -> Self {
        Self::new(promo.promo_type, promo.value)
    }
}

/// Outcome of a discount calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountResult {
    pub original_amount: Money,
    pub discount: Money,
    pub final_amount: Money,
}

/// Computes the discount for `amount` under `terms`.
///
/// The discount never exceeds the amount and the final amount is never
/// negative, whatever the promo value.
pub fn calculate_discount(amount: Money, terms: &DiscountTerms) -> DiscountResult {
    let ceiling = amount.clamp_non_negative();

    let raw = match terms.promo_type {
        PromoType::Percentage => amount.percentage_bps(terms.value.clamp(0, FULL_PERCENT_BPS)),
        PromoType::FixedAmount => Money::from_cents(terms.value),
        PromoType::FreeTrial => ceiling,
    };
    let discount = raw.clamp_non_negative().min(ceiling);

    DiscountResult {
        original_amount: amount,
        discount,
        final_amount: (amount - discount).clamp_non_negative(),
    }
}

/// The result when no promo applies.
pub fn no_discount(amount: Money) -> DiscountResult {
    DiscountResult {
        original_amount: amount,
        discount: Money::zero(),
        final_amount: amount,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn calc(amount: i64, promo_type: PromoType, value: i64) -> DiscountResult {
        calculate_discount(Money::from_cents(amount), &DiscountTerms::new(promo_type, value))
    }

    #[test]
    fn test_summer10_on_100_euros() {
        let result = calc(10000, PromoType::Percentage, 1000);
        assert_eq!(result.discount.cents(), 1000);
        assert_eq!(result.final_amount.cents(), 9000);
        assert_eq!(result.original_amount.cents(), 10000);
    }

    #[test]
    fn test_percentage_matches_proportion() {
        for (amount, bps) in [(2990, 2500), (1, 5000), (12345, 1), (999, 10000)] {
            let result = calc(amount, PromoType::Percentage, bps);
            let expected_final = amount - (amount * bps + 5000) / 10000;
            assert_eq!(result.final_amount.cents(), expected_final);
            assert!(!result.final_amount.is_negative());
        }
    }

    #[test]
    fn test_percentage_over_hundred_is_capped() {
        let result = calc(5000, PromoType::Percentage, 15000);
        assert_eq!(result.discount.cents(), 5000);
        assert!(result.final_amount.is_zero());
    }

    #[test]
    fn test_fixed_amount_never_goes_negative() {
        let result = calc(1500, PromoType::FixedAmount, 2000);
        assert_eq!(result.discount.cents(), 1500);
        assert!(result.final_amount.is_zero());

        let result = calc(1500, PromoType::FixedAmount, 500);
        assert_eq!(result.final_amount.cents(), 1000);
    }

    #[test]
    fn test_free_trial_charges_nothing() {
        let result = calc(2990, PromoType::FreeTrial, 30);
        assert_eq!(result.discount.cents(), 2990);
        assert!(result.final_amount.is_zero());
    }

    #[test]
    fn test_negative_promo_value_gives_no_discount() {
        let result = calc(1000, PromoType::FixedAmount, -500);
        assert!(result.discount.is_zero());
        assert_eq!(result.final_amount.cents(), 1000);
    }

    #[test]
    fn test_no_discount() {
        let result = no_discount(Money::from_cents(2990));
        assert_eq!(result.final_amount, result.original_amount);
        assert!(result.discount.is_zero());
    }
}
