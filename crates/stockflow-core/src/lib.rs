//! # stockflow-core: Pure Business Logic for Stockflow
//!
//! This crate holds the rules that decide money and quantities: purchase
//! order totals, supplier price diffs, promo code validity, discounts and
//! webhook signatures. Everything here is a pure function with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockflow Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web client (SPA)                             │   │
//! │  │   Purchase orders ──► Price review ──► Checkout ──► Plan page   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTPS / JSON                           │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/api (axum)                              │   │
//! │  │   receive_purchase_order, create_mbway_payment, webhook, ...   │   │
//! │  └──────────────┬──────────────────────────────────┬───────────────┘   │
//! │                 │                                  │                    │
//! │  ┌──────────────▼──────────────────────────────────▼───────────────┐   │
//! │  │               ★ stockflow-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │  ┌──────────┐ ┌────────────┐ ┌───────┐ ┌──────────┐ ┌────────┐ │   │
//! │  │  │  money   │ │ purchasing │ │ promo │ │ discount │ │webhook │ │   │
//! │  │  │  Money   │ │ PriceDiff  │ │ rules │ │  calc    │ │ HMAC   │ │   │
//! │  │  └──────────┘ └────────────┘ └───────┘ └──────────┘ └────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                 │                                  │                    │
//! │  ┌──────────────▼───────────────┐  ┌───────────────▼────────────────┐  │
//! │  │ stockflow-db (document store)│  │ stockflow-gateway (EuPago)     │  │
//! │  └──────────────────────────────┘  └────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (PurchaseOrder, SupplierPrice, PromoCode, Payment, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation, phone normalization, reference formatting
//! - [`purchasing`] - Order totals, price diffs, the price-confirmation decision
//! - [`promo`] - The single promo code validity rule
//! - [`discount`] - Discount calculator
//! - [`webhook`] - Gateway signature verification and status mapping
//!
//! ## Example Usage
//!
//! ```rust
//! use stockflow_core::discount::{calculate_discount, DiscountTerms};
//! use stockflow_core::money::Money;
//! use stockflow_core::types::PromoType;
//!
//! let terms = DiscountTerms::new(PromoType::Percentage, 1000); // 10%
//! let result = calculate_discount(Money::from_cents(10000), &terms);
//!
//! assert_eq!(result.discount.cents(), 1000);
//! assert_eq!(result.final_amount.cents(), 9000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod discount;
pub mod error;
pub mod money;
pub mod promo;
pub mod purchasing;
pub mod types;
pub mod validation;
pub mod webhook;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Largest quantity accepted on a single purchase order line.
///
/// ## Business Reason
/// Catches typos like an extra zero before they inflate stock.
pub const MAX_ORDER_QUANTITY: i64 = 1_000_000;

/// Largest unit price accepted on a purchase order line (€10,000,000.00).
pub const MAX_UNIT_PRICE_CENTS: i64 = 1_000_000_000;

/// Basis points in 100%.
pub const FULL_PERCENT_BPS: i64 = 10_000;

/// Header carrying the gateway's webhook signature.
pub const SIGNATURE_HEADER: &str = "x-eupago-signature";
