//! # Error Types
//!
//! Domain-specific error types for stockflow-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockflow-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockflow-db errors       └── DbError       - Store failures          │
//! │  stockflow-gateway errors  └── GatewayError  - EuPago failures         │
//! │                                                                         │
//! │  apps/api                  └── ApiError      - What clients see        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                  │
//! │        DbError ─────────────────────┼──► ApiError → JSON response      │
//! │        GatewayError ────────────────┘                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (order id, code, status)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Purchase order does not exist for this company.
    #[error("Purchase order not found: {0}")]
    PurchaseOrderNotFound(String),

    /// Purchase order was already received.
    ///
    /// ## When This Occurs
    /// Receiving twice would add the ordered quantities to stock again,
    /// so a second receive is refused outright.
    #[error("Purchase order {0} has already been received")]
    OrderAlreadyReceived(String),

    /// Purchase order is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Receiving a cancelled order
    /// - Cancelling or deleting an order that is being received
    #[error("Purchase order {order_id} is {status}, cannot {operation}")]
    InvalidOrderStatus {
        order_id: String,
        status: String,
        operation: String,
    },

    /// Promo code failed validation.
    #[error("Promo code {code} is not valid: {reason}")]
    PromoCodeInvalid { code: String, reason: String },

    /// Payment amount is invalid.
    #[error("Invalid payment amount: {reason}")]
    InvalidPaymentAmount { reason: String },

    /// Webhook signature did not match the body.
    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any write or gateway call.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid phone number, invalid amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate promo code).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    /// Shorthand for a missing required field.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InvalidOrderStatus {
            order_id: "po-1".to_string(),
            status: "cancelled".to_string(),
            operation: "receive".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Purchase order po-1 is cancelled, cannot receive"
        );

        let err = CoreError::OrderAlreadyReceived("po-2".to_string());
        assert_eq!(err.to_string(), "Purchase order po-2 has already been received");
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(ValidationError::required("planId").to_string(), "planId is required");

        let err = ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must be a 9-digit mobile number".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "phone has invalid format: must be a 9-digit mobile number"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("userId").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
