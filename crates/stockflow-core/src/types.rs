//! # Domain Types
//!
//! Core domain types used throughout Stockflow.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Purchasing                                                             │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ PurchaseOrder   │   │ SupplierPrice   │   │    Product      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  supplier_id    │   │  product×supplr │   │  stock          │       │
//! │  │  items[]        │──►│  price_history[]│   │  movements[]    │       │
//! │  │  status         │   │  is_preferred   │   │  (sub-ledger)   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Billing                                                                │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   PromoCode     │   │    Payment      │   │    Company      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  code, type     │──►│  amount, status │──►│  plan_id        │       │
//! │  │  window, cap    │   │  gateway_id     │   │  subscription   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Document Shape
//! Every entity is stored as one JSON document with camelCase field names.
//! `Option` fields may be absent; `Vec` fields default to empty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Purchase Order Status
// =============================================================================

/// Lifecycle of a purchase order.
///
/// ## Transitions
/// ```text
///   pending ──┬──► receiving ──► received
///   ordered ──┤
///             └──► cancelled
/// ```
/// `receiving` is the in-progress marker of a receipt; an order found in this
/// state had its receipt interrupted and is resumed by the next receive call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    /// Draft, not yet sent to the supplier.
    Pending,
    /// Sent to the supplier, awaiting delivery.
    Ordered,
    /// Receipt in progress (some lines may already be applied).
    Receiving,
    /// Goods received, stock updated. Terminal.
    Received,
    /// Order cancelled. Terminal.
    Cancelled,
}

impl PurchaseOrderStatus {
    /// Returns the stored string form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PurchaseOrderStatus::Pending => "pending",
            PurchaseOrderStatus::Ordered => "ordered",
            PurchaseOrderStatus::Receiving => "receiving",
            PurchaseOrderStatus::Received => "received",
            PurchaseOrderStatus::Cancelled => "cancelled",
        }
    }

    /// True before any receipt work started.
    pub const fn is_pre_receipt(&self) -> bool {
        matches!(self, PurchaseOrderStatus::Pending | PurchaseOrderStatus::Ordered)
    }
}

impl Default for PurchaseOrderStatus {
    fn default() -> Self {
        PurchaseOrderStatus::Ordered
    }
}

impl fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Purchase Order
// =============================================================================

/// A line on a purchase order.
///
/// Product name is a snapshot taken when the order was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderItem {
    /// Product reference. Free-text lines have none.
    pub product_id: Option<String>,
    /// Product name at time of ordering (frozen).
    pub product_name: String,
    /// Ordered quantity (> 0).
    pub quantity: i64,
    /// Negotiated unit price; unpriced lines never touch the price ledger.
    pub unit_price: Option<Money>,
}

impl PurchaseOrderItem {
    /// Line total (quantity × unit price, zero when unpriced), `None` when
    /// it does not fit in cents.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price
            .unwrap_or_default()
            .checked_multiply_quantity(self.quantity)
    }
}

/// A request to a supplier for goods.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    pub id: String,
    pub company_id: String,
    /// Human-readable number, e.g. `PO-20260116-4F2A9C`.
    pub order_number: String,
    pub supplier_id: String,
    /// Supplier name at time of ordering (frozen).
    pub supplier_name: String,
    #[ts(as = "String")]
    pub order_date: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub expected_date: Option<DateTime<Utc>>,
    pub items: Vec<PurchaseOrderItem>,
    /// Σ quantity × unit price.
    pub total: Money,
    pub status: PurchaseOrderStatus,
    #[ts(as = "Option<String>")]
    pub received_date: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub receiving_started_at: Option<DateTime<Utc>>,
    /// Price decision recorded when receiving started.
    pub update_prices: Option<bool>,
    /// Indexes of lines whose stock/price writes are committed.
    #[serde(default)]
    pub received_lines: Vec<usize>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl PurchaseOrder {
    /// True when the line at `index` was already applied by a receipt.
    pub fn is_line_received(&self, index: usize) -> bool {
        self.received_lines.contains(&index)
    }
}

// =============================================================================
// Supplier Price
// =============================================================================

/// One appended entry of the price ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistoryEntry {
    pub price: Money,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    /// Purchase order that produced this price.
    pub purchase_order_id: Option<String>,
    /// Price before this entry (none for the first entry).
    pub previous_price: Option<Money>,
}

/// Purchase price ledger for one product from one supplier.
///
/// ## Invariant
/// `price_history` is append-only. The current price is the last entry;
/// `purchase_price` mirrors it for readers that only want a number.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPrice {
    /// Same as `supplier_id` (one document per supplier under the product).
    pub id: String,
    pub product_id: String,
    pub supplier_id: String,
    pub supplier_name: String,
    pub purchase_price: Money,
    pub last_purchase_price: Option<Money>,
    #[ts(as = "Option<String>")]
    pub last_purchase_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub price_history: Vec<PriceHistoryEntry>,
    #[serde(default)]
    pub is_preferred: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl SupplierPrice {
    /// Current price, derived from the ledger.
    ///
    /// Concurrent receipts can race on `purchase_price`; the history append
    /// is atomic, so the last history entry is the source of truth.
    pub fn current_price(&self) -> Money {
        self.price_history
            .last()
            .map(|entry| entry.price)
            .unwrap_or(self.purchase_price)
    }
}

// =============================================================================
// Product & Stock Movements
// =============================================================================

/// A stocked product (only the fields the receiving engine touches).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub company_id: String,
    pub name: String,
    pub sku: Option<String>,
    /// Net sum of all movement quantities.
    #[serde(default)]
    pub stock: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Kind of stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    In,
    Out,
    Transfer,
    Adjustment,
}

/// An entry in a product's movement sub-ledger.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    /// Signed quantity applied to `Product.stock`.
    pub quantity: i64,
    pub reason: String,
    pub purchase_order_id: Option<String>,
    pub supplier_id: Option<String>,
    pub supplier_name: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Promo Codes
// =============================================================================

/// How a promo code discounts.
///
/// ## Value Units
/// - `Percentage`: basis points (1000 = 10%)
/// - `FixedAmount`: cents
/// - `FreeTrial`: trial length in days (the charge is zero)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PromoType {
    Percentage,
    FixedAmount,
    FreeTrial,
}

/// How long a promo keeps applying to a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PromoDuration {
    Once,
    Repeating,
    Forever,
}

impl Default for PromoDuration {
    fn default() -> Self {
        PromoDuration::Once
    }
}

/// A discount token.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PromoCode {
    pub id: String,
    /// Upper-case normalized code.
    pub code: String,
    #[serde(rename = "type")]
    pub promo_type: PromoType,
    /// See [`PromoType`] for units.
    pub value: i64,
    pub description: Option<String>,
    pub active: bool,
    #[ts(as = "Option<String>")]
    pub valid_from: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub valid_until: Option<DateTime<Utc>>,
    pub max_uses: Option<i64>,
    #[serde(default)]
    pub used_count: i64,
    #[serde(default)]
    pub duration: PromoDuration,
    /// Months the discount repeats for (`Repeating` only).
    pub duration_months: Option<u32>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Payments
// =============================================================================

/// Payment method offered by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Push payment approved in the payer's banking app.
    Mbway,
    /// Entity/reference voucher paid at an ATM or home banking.
    Multibanco,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Mbway => "mbway",
            PaymentMethod::Multibanco => "multibanco",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment status. `Paid` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }

    /// True for states that never change again.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Failed)
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The discount as computed when the payment was created (frozen).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountSnapshot {
    /// Promo redeemed when the payment is paid.
    pub promo_id: String,
    pub code: String,
    #[serde(rename = "type")]
    pub promo_type: PromoType,
    pub value: i64,
    pub discount: Money,
    pub original_amount: Money,
    pub final_amount: Money,
}

/// A subscription payment attempt.
///
/// ## Invariant
/// `amount = original_amount - discount.discount` when discounted,
/// otherwise `amount = original_amount`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub user_id: String,
    pub company_id: Option<String>,
    pub plan_id: String,
    pub method: PaymentMethod,
    pub amount: Money,
    pub original_amount: Money,
    pub discount: Option<DiscountSnapshot>,
    pub status: PaymentStatus,
    /// Normalized 9-digit phone (MB WAY only).
    pub phone: Option<String>,
    pub gateway_reference: Option<String>,
    /// The gateway's own id; webhooks are matched on this.
    pub gateway_id: Option<String>,
    /// Multibanco entity code.
    pub entity: Option<String>,
    #[ts(skip)]
    pub gateway_payload: Option<serde_json::Value>,
    #[ts(skip)]
    pub webhook_payload: Option<serde_json::Value>,
    pub failure_reason: Option<String>,
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
    /// Set once the paid subscription has been applied to the company.
    #[ts(as = "Option<String>")]
    pub subscription_activated_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Companies & Users
// =============================================================================

/// Subscription state of a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Cancelled,
    Inactive,
}

impl Default for SubscriptionStatus {
    fn default() -> Self {
        SubscriptionStatus::Inactive
    }
}

/// A tenant.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub plan_id: Option<String>,
    #[serde(default)]
    pub subscription_status: SubscriptionStatus,
    #[ts(as = "Option<String>")]
    pub last_payment_date: Option<DateTime<Utc>>,
    pub last_payment_amount: Option<Money>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// An account holder.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub company_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(cents: i64) -> PriceHistoryEntry {
        PriceHistoryEntry {
            price: Money::from_cents(cents),
            date: Utc::now(),
            purchase_order_id: None,
            previous_price: None,
        }
    }

    #[test]
    fn test_current_price_follows_history() {
        let now = Utc::now();
        let mut price = SupplierPrice {
            id: "sup-1".to_string(),
            product_id: "p-1".to_string(),
            supplier_id: "sup-1".to_string(),
            supplier_name: "Acme".to_string(),
            purchase_price: Money::from_cents(450),
            last_purchase_price: None,
            last_purchase_date: None,
            price_history: vec![],
            is_preferred: false,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(price.current_price().cents(), 450);

        price.price_history.push(entry(500));
        price.price_history.push(entry(520));
        assert_eq!(price.current_price().cents(), 520);
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(PurchaseOrderStatus::Received.to_string(), "received");
        assert_eq!(PaymentStatus::Paid.as_str(), "paid");
        assert_eq!(PaymentMethod::Multibanco.to_string(), "multibanco");
        assert!(PurchaseOrderStatus::Ordered.is_pre_receipt());
        assert!(!PurchaseOrderStatus::Receiving.is_pre_receipt());
        assert!(PaymentStatus::Failed.is_terminal());
        assert!(!PaymentStatus::Pending.is_terminal());
    }

    #[test]
    fn test_document_field_names() {
        let movement = StockMovement {
            id: "m-1".to_string(),
            product_id: "p-1".to_string(),
            movement_type: MovementType::In,
            quantity: 10,
            reason: "PO-1".to_string(),
            purchase_order_id: Some("po-1".to_string()),
            supplier_id: None,
            supplier_name: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&movement).unwrap();
        assert_eq!(json["type"], "in");
        assert_eq!(json["purchaseOrderId"], "po-1");
        assert_eq!(json["quantity"], 10);
    }

    #[test]
    fn test_line_total() {
        let item = PurchaseOrderItem {
            product_id: Some("p-1".to_string()),
            product_name: "Widget".to_string(),
            quantity: 10,
            unit_price: Some(Money::from_cents(500)),
        };
        assert_eq!(item.line_total(), Some(Money::from_cents(5000)));

        let unpriced = PurchaseOrderItem {
            unit_price: None,
            ..item.clone()
        };
        assert_eq!(unpriced.line_total(), Some(Money::zero()));

        let huge = PurchaseOrderItem {
            unit_price: Some(Money::from_cents(i64::MAX / 2)),
            ..item
        };
        assert_eq!(huge.line_total(), None);
    }

    #[test]
    fn test_missing_optional_fields_deserialize() {
        let json = serde_json::json!({
            "id": "c-1",
            "name": "Acme Lda",
            "ownerId": "u-1",
            "createdAt": "2026-01-01T00:00:00Z",
            "updatedAt": "2026-01-01T00:00:00Z"
        });
        let company: Company = serde_json::from_value(json).unwrap();
        assert_eq!(company.subscription_status, SubscriptionStatus::Inactive);
        assert!(company.plan_id.is_none());
    }
}
