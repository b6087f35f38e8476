//! # Purchasing Module
//!
//! Order totals, supplier price diffs and the receiving decision rules.
//!
//! ## Price-Confirmation Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   idle ──► operator requests receive ──► checking diffs                 │
//! │                                             │                           │
//! │                       ┌─────────────────────┴──────────┐                │
//! │                       ▼                                ▼                │
//! │                   no diffs                        diffs found           │
//! │                       │                                │                │
//! │                       │                      awaiting decision          │
//! │                       │                   ┌────────────┴────────────┐   │
//! │                       │                   ▼                         ▼   │
//! │                       │            update_prices               keep_prices
//! │                       │                   │                         │   │
//! │                       └───────────────────┴──────► confirmed receive    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no partial decline: a decision covers every changed line.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{
    PriceHistoryEntry, PurchaseOrder, PurchaseOrderItem, PurchaseOrderStatus, SupplierPrice,
};
use crate::validation::ValidationResult;

// =============================================================================
// Order Totals & Numbers
// =============================================================================

/// Σ quantity × unit price across all lines.
///
/// ## Errors
/// - `OutOfRange` on `total` when the sum does not fit in cents
pub fn order_total(items: &[PurchaseOrderItem]) -> ValidationResult<Money> {
    items
        .iter()
        .try_fold(Money::zero(), |total, item| {
            item.line_total().and_then(|line| total.checked_add(line))
        })
        .ok_or_else(|| ValidationError::OutOfRange {
            field: "total".to_string(),
            min: 0,
            max: i64::MAX,
        })
}

/// Generates a human-readable order number, e.g. `PO-20260116-4F2A9C`.
pub fn generate_order_number(date: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
    format!("PO-{}-{}", date.format("%Y%m%d"), suffix)
}

// =============================================================================
// Price Diffs
// =============================================================================

/// A line whose price differs from the ledger (or has no ledger yet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceDiff {
    pub product_id: String,
    pub product_name: String,
    pub supplier_name: String,
    /// Current ledger price; `None` when `is_new`.
    pub old_price: Option<Money>,
    pub new_price: Money,
    /// No SupplierPrice exists yet for this product and supplier.
    pub is_new: bool,
}

/// Compares an order's priced lines against the supplier's ledger.
///
/// `existing` maps product id to the SupplierPrice for the order's supplier.
/// Lines without a product reference or a unit price are skipped. One diff is
/// emitted per differing line.
///
/// ## Example
/// ```text
/// line P1 @ 5.00, no ledger          → { oldPrice: null, newPrice: 5.00, isNew: true }
/// line P2 @ 3.00, ledger current 3.00 → (nothing)
/// line P3 @ 2.50, ledger current 2.20 → { oldPrice: 2.20, newPrice: 2.50, isNew: false }
/// ```
pub fn price_diffs(
    order: &PurchaseOrder,
    existing: &HashMap<String, SupplierPrice>,
) -> Vec<PriceDiff> {
    order
        .items
        .iter()
        .filter_map(|item| {
            let product_id = item.product_id.as_ref()?;
            let new_price = item.unit_price?;

            match existing.get(product_id) {
                None => Some(PriceDiff {
                    product_id: product_id.clone(),
                    product_name: item.product_name.clone(),
                    supplier_name: order.supplier_name.clone(),
                    old_price: None,
                    new_price,
                    is_new: true,
                }),
                Some(ledger) => {
                    let old_price = ledger.current_price();
                    (old_price != new_price).then(|| PriceDiff {
                        product_id: product_id.clone(),
                        product_name: item.product_name.clone(),
                        supplier_name: order.supplier_name.clone(),
                        old_price: Some(old_price),
                        new_price,
                        is_new: false,
                    })
                }
            }
        })
        .collect()
}

// =============================================================================
// Receiving Decision
// =============================================================================

/// The operator's answer to a price review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PriceDecision {
    /// Propagate the order's prices into the ledger.
    UpdatePrices,
    /// Receive stock only; the ledger stays untouched.
    KeepPrices,
}

impl PriceDecision {
    pub const fn updates_prices(&self) -> bool {
        matches!(self, PriceDecision::UpdatePrices)
    }
}

/// What the receive endpoint should do next.
#[derive(Debug, Clone, PartialEq)]
pub enum ReceivePlan {
    /// Go ahead and receive.
    Proceed { update_prices: bool },
    /// Prices changed and nobody decided yet.
    AwaitDecision(Vec<PriceDiff>),
}

/// Applies the price-confirmation protocol.
///
/// With no diffs the ledger is still written (there is nothing to overwrite
/// silently, and the history gets its entry for this order).
pub fn plan_receipt(diffs: Vec<PriceDiff>, decision: Option<PriceDecision>) -> ReceivePlan {
    match decision {
        Some(decision) => ReceivePlan::Proceed {
            update_prices: decision.updates_prices(),
        },
        None if diffs.is_empty() => ReceivePlan::Proceed {
            update_prices: true,
        },
        None => ReceivePlan::AwaitDecision(diffs),
    }
}

/// Where a receive call starts from, given the order's persisted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveStage {
    /// No receipt work has happened yet.
    Fresh,
    /// A previous receipt was interrupted; finish it with its recorded
    /// price decision.
    Resume { update_prices: bool },
}

/// Gates a receive call on the order status.
///
/// ## Errors
/// - `OrderAlreadyReceived`: receiving again would double-count stock
/// - `InvalidOrderStatus`: cancelled orders are never received
pub fn receive_stage(order: &PurchaseOrder) -> CoreResult<ReceiveStage> {
    match order.status {
        PurchaseOrderStatus::Pending | PurchaseOrderStatus::Ordered => Ok(ReceiveStage::Fresh),
        PurchaseOrderStatus::Receiving => Ok(ReceiveStage::Resume {
            // Without a recorded decision the ledger is left alone.
            update_prices: order.update_prices.unwrap_or(false),
        }),
        PurchaseOrderStatus::Received => Err(CoreError::OrderAlreadyReceived(order.id.clone())),
        PurchaseOrderStatus::Cancelled => Err(CoreError::InvalidOrderStatus {
            order_id: order.id.clone(),
            status: order.status.to_string(),
            operation: "receive".to_string(),
        }),
    }
}

/// Lines not yet applied by a (possibly interrupted) receipt.
pub fn pending_lines(order: &PurchaseOrder) -> impl Iterator<Item = (usize, &PurchaseOrderItem)> {
    order
        .items
        .iter()
        .enumerate()
        .filter(move |(index, _)| !order.is_line_received(*index))
}

/// Builds the ledger entry a receipt appends.
pub fn next_history_entry(
    existing: Option<&SupplierPrice>,
    price: Money,
    date: DateTime<Utc>,
    purchase_order_id: &str,
) -> PriceHistoryEntry {
    PriceHistoryEntry {
        price,
        date,
        purchase_order_id: Some(purchase_order_id.to_string()),
        previous_price: existing.map(SupplierPrice::current_price),
    }
}

/// Gates cancellation: only orders with no receipt work can be cancelled.
pub fn ensure_cancellable(order: &PurchaseOrder) -> CoreResult<()> {
    if order.status.is_pre_receipt() {
        Ok(())
    } else {
        Err(CoreError::InvalidOrderStatus {
            order_id: order.id.clone(),
            status: order.status.to_string(),
            operation: "cancel".to_string(),
        })
    }
}

/// Gates deletion: allowed before receipt, and for cancelled orders.
pub fn ensure_deletable(order: &PurchaseOrder) -> CoreResult<()> {
    if order.status.is_pre_receipt() || order.status == PurchaseOrderStatus::Cancelled {
        Ok(())
    } else {
        Err(CoreError::InvalidOrderStatus {
            order_id: order.id.clone(),
            status: order.status.to_string(),
            operation: "delete".to_string(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
