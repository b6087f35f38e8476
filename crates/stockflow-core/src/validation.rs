//! # Validation Module
//!
//! Input validation utilities for Stockflow.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Web client                                                   │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: API handler (Rust)                                           │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Gateway / store                                              │
//! │  └── Nothing reaches them unless layer 2 passed                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockflow_core::validation::{normalize_phone, validate_push_phone};
//!
//! let phone = normalize_phone("+351 912 345 678");
//! assert_eq!(phone, "912345678");
//! assert!(validate_push_phone(&phone).is_ok());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::PurchaseOrderItem;
use crate::purchasing::order_total;
use crate::{MAX_ORDER_QUANTITY, MAX_UNIT_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates that a field is present and not blank.
///
/// ## Example
/// ```rust
/// use stockflow_core::validation::validate_required;
///
/// assert!(validate_required("planId", "pro-monthly").is_ok());
/// assert!(validate_required("planId", "  ").is_err());
/// ```
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

/// Validates an optional field, treating `None` as missing.
pub fn require_present<'a>(field: &str, value: Option<&'a str>) -> ValidationResult<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim()),
        _ => Err(ValidationError::required(field)),
    }
}

/// Validates a free-text name (supplier, product line).
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required(field));
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a promo code string.
///
/// ## Rules
/// - 3 to 32 characters after trimming
/// - Letters, digits, hyphens and underscores only
///
/// ## Example
/// ```rust
/// use stockflow_core::validation::validate_promo_code_format;
///
/// assert!(validate_promo_code_format("SUMMER10").is_ok());
/// assert!(validate_promo_code_format("no spaces").is_err());
/// ```
pub fn validate_promo_code_format(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::required("code"));
    }

    if code.len() > 32 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 32,
        });
    }

    if code.len() < 3
        || !code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "3+ letters, digits, hyphens or underscores".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an ordered quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ORDER_QUANTITY
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if quantity > MAX_ORDER_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ORDER_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free samples)
pub fn validate_price_cents(price_cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_UNIT_PRICE_CENTS).contains(&price_cents) {
        return Err(ValidationError::OutOfRange {
            field: "unitPrice".to_string(),
            min: 0,
            max: MAX_UNIT_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a payment amount. Zero and negative amounts are refused.
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }
    Ok(())
}

/// Validates the lines of a new purchase order.
pub fn validate_order_items(items: &[PurchaseOrderItem]) -> ValidationResult<()> {
    if items.is_empty() {
        return Err(ValidationError::required("items"));
    }

    for item in items {
        validate_name("productName", &item.product_name)?;
        validate_quantity(item.quantity)?;
        if let Some(price) = item.unit_price {
            validate_price_cents(price.cents())?;
        }
    }

    order_total(items)?;
    Ok(())
}

// =============================================================================
// Phone & Reference Formatting
// =============================================================================

/// Strips all non-digits and keeps the last 9.
///
/// ## Example
/// ```rust
/// use stockflow_core::validation::normalize_phone;
///
/// assert_eq!(normalize_phone("00351-912-345-678"), "912345678");
/// assert_eq!(normalize_phone("12 34"), "1234");
/// ```
pub fn normalize_phone(raw: &str) -> String {
    let digits: Vec<char> = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let start = digits.len().saturating_sub(9);
    digits[start..].iter().collect()
}

/// Validates a normalized push-payment handle: `^9\d{8}$`.
pub fn validate_push_phone(phone: &str) -> ValidationResult<()> {
    let valid = phone.len() == 9
        && phone.starts_with('9')
        && phone.chars().all(|c| c.is_ascii_digit());

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must be a 9-digit mobile number starting with 9".to_string(),
        });
    }

    Ok(())
}

/// Groups a voucher reference into 3-digit clusters for display.
///
/// Presentation only. The raw reference is what goes to and from the gateway.
///
/// ## Example
/// ```rust
/// use stockflow_core::validation::format_voucher_reference;
///
/// assert_eq!(format_voucher_reference("123456789"), "123 456 789");
/// assert_eq!(format_voucher_reference("1234"), "123 4");
/// ```
pub fn format_voucher_reference(reference: &str) -> String {
    let chars: Vec<char> = reference.chars().filter(|c| !c.is_whitespace()).collect();
    chars
        .chunks(3)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ORDER_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_quantity(MAX_ORDER_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(499).is_ok());
        assert!(validate_price_cents(-1).is_err());
        assert!(validate_price_cents(MAX_UNIT_PRICE_CENTS).is_ok());
        assert!(validate_price_cents(10_000_000_000_000).is_err());
    }

    #[test]
    fn test_validate_payment_amount() {
        assert!(validate_payment_amount(Money::from_cents(1)).is_ok());
        assert!(validate_payment_amount(Money::zero()).is_err());
        assert!(validate_payment_amount(Money::from_cents(-100)).is_err());
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("912345678"), "912345678");
        assert_eq!(normalize_phone("+351 912 345 678"), "912345678");
        assert_eq!(normalize_phone("(+351) 96-123-4567"), "961234567");
        assert_eq!(normalize_phone(""), "");
    }

    #[test]
    fn test_validate_push_phone() {
        assert!(validate_push_phone("912345678").is_ok());
        assert!(validate_push_phone("212345678").is_err());
        assert!(validate_push_phone("91234567").is_err());
        assert!(validate_push_phone(&normalize_phone("+351 21 123 4567")).is_err());
    }

    #[test]
    fn test_format_voucher_reference() {
        assert_eq!(format_voucher_reference("987654321"), "987 654 321");
        assert_eq!(format_voucher_reference("987 654 321"), "987 654 321");
        assert_eq!(format_voucher_reference(""), "");
    }

    #[test]
    fn test_validate_promo_code_format() {
        assert!(validate_promo_code_format("WELCOME-2026").is_ok());
        assert!(validate_promo_code_format("ab").is_err());
        assert!(validate_promo_code_format("").is_err());
        assert!(validate_promo_code_format(&"X".repeat(40)).is_err());
    }

    #[test]
    fn test_validate_order_items() {
        let good = PurchaseOrderItem {
            product_id: Some("p-1".to_string()),
            product_name: "Widget".to_string(),
            quantity: 2,
            unit_price: Some(Money::from_cents(100)),
        };
        assert!(validate_order_items(&[good.clone()]).is_ok());
        assert!(validate_order_items(&[]).is_err());

        let zero_qty = PurchaseOrderItem {
            quantity: 0,
            ..good.clone()
        };
        assert!(validate_order_items(&[good.clone(), zero_qty]).is_err());

        // Each line is in range but the order total is not
        let max_line = PurchaseOrderItem {
            quantity: MAX_ORDER_QUANTITY,
            unit_price: Some(Money::from_cents(MAX_UNIT_PRICE_CENTS)),
            ..good
        };
        assert!(validate_order_items(&[max_line.clone()]).is_ok());
        assert!(matches!(
            validate_order_items(&vec![max_line; 10_000]),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_require_present() {
        assert_eq!(require_present("userId", Some(" u-1 ")).unwrap(), "u-1");
        assert!(require_present("userId", None).is_err());
        assert!(require_present("userId", Some("")).is_err());
    }
}
