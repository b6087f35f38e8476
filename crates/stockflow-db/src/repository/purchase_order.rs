//! # Purchase Order Repository
//!
//! Orders, their status transitions, and the atomic write for one received
//! line.
//!
//! ## Receipt Line Batch
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  apply_receipt_line(order, index, update_prices)                        │
//! │                                                                         │
//! │  read:  product (must exist), SupplierPrice(product, supplier)          │
//! │                                                                         │
//! │  ┌──────────────── one transaction ────────────────┐                    │
//! │  │ purchaseOrders/{id}.lineClaims.l{index}  claim  │ ✗ → already applied│
//! │  │ products/{pid}.stock        += quantity         │                    │
//! │  │ products/{pid}/movements    create "in" entry   │                    │
//! │  │ supplierPrices/{supplier}   create | append+merge  (update_prices)   │
//! │  │ purchaseOrders/{id}.receivedLines  append index │                    │
//! │  └─────────────────────────────────────────────────┘                    │
//! │                                                                         │
//! │  Either everything for the line lands, or nothing does.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use crate::collections;
use crate::error::{DbError, DbResult};
use crate::store::{DocumentStore, FieldValue, Filter};
use stockflow_core::purchasing::next_history_entry;
use stockflow_core::{
    MovementType, Product, PurchaseOrder, PurchaseOrderItem, PurchaseOrderStatus, StockMovement,
    SupplierPrice,
};

/// Repository for purchase orders.
#[derive(Debug, Clone)]
pub struct PurchaseOrderRepository {
    store: DocumentStore,
}

impl PurchaseOrderRepository {
    pub fn new(store: DocumentStore) -> Self {
        PurchaseOrderRepository { store }
    }

    pub async fn get(&self, company_id: &str, order_id: &str) -> DbResult<Option<PurchaseOrder>> {
        self.store
            .get(&collections::purchase_orders(company_id), order_id)
            .await
    }

    pub async fn get_required(&self, company_id: &str, order_id: &str) -> DbResult<PurchaseOrder> {
        self.store
            .get_required(
                &collections::purchase_orders(company_id),
                order_id,
                "PurchaseOrder",
            )
            .await
    }

    /// Lists a company's orders, optionally by status, oldest first.
    pub async fn list(
        &self,
        company_id: &str,
        status: Option<PurchaseOrderStatus>,
    ) -> DbResult<Vec<PurchaseOrder>> {
        let filters: Vec<Filter> = status
            .map(|s| Filter::eq("status", s.as_str()))
            .into_iter()
            .collect();

        self.store
            .query(&collections::purchase_orders(company_id), &filters)
            .await
    }

    /// Writes a new order.
    pub async fn insert(&self, order: &PurchaseOrder) -> DbResult<()> {
        debug!(order_id = %order.id, order_number = %order.order_number, "Creating purchase order");
        self.store
            .create(&collections::purchase_orders(&order.company_id), &order.id, order)
            .await
    }

    pub async fn delete(&self, company_id: &str, order_id: &str) -> DbResult<()> {
        self.store
            .delete(&collections::purchase_orders(company_id), order_id)
            .await
    }

    /// Moves `order` from its current status to `next` (and merges `extra`)
    /// only if nobody changed the status in between.
    async fn transition(
        &self,
        order: &PurchaseOrder,
        next: PurchaseOrderStatus,
        mut patch: serde_json::Value,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        if let Some(map) = patch.as_object_mut() {
            map.insert("status".to_string(), json!(next));
            map.insert("updatedAt".to_string(), json!(now));
        }

        self.store
            .update_where(
                &collections::purchase_orders(&order.company_id),
                &order.id,
                &Filter::eq("status", order.status.as_str()),
                &patch,
            )
            .await
    }

    /// pending/ordered → cancelled. Returns false if the status moved.
    pub async fn cancel(&self, order: &PurchaseOrder, now: DateTime<Utc>) -> DbResult<bool> {
        self.transition(order, PurchaseOrderStatus::Cancelled, json!({}), now)
            .await
    }

    /// pending/ordered → receiving, persisting the price decision.
    ///
    /// Returns false when another receive got there first.
    pub async fn begin_receiving(
        &self,
        order: &PurchaseOrder,
        update_prices: bool,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let patch = json!({
            "receivingStartedAt": now,
            "receivedDate": now,
            "updatePrices": update_prices,
            "receivedLines": [],
        });
        self.transition(order, PurchaseOrderStatus::Receiving, patch, now)
            .await
    }

    /// receiving → received.
    pub async fn finish_receiving(&self, order: &PurchaseOrder, now: DateTime<Utc>) -> DbResult<bool> {
        let receiving = PurchaseOrder {
            status: PurchaseOrderStatus::Receiving,
            ..order.clone()
        };
        self.transition(&receiving, PurchaseOrderStatus::Received, json!({}), now)
            .await
    }

    /// Applies one order line atomically.
    ///
    /// The batch opens with a conditional claim on the line, so two receive
    /// calls racing over the same order apply it once. Returns false when
    /// the line was already claimed; nothing is written then.
    ///
    /// Lines without a product reference are only marked as applied. With
    /// `update_prices`, priced lines also write the supplier price ledger:
    /// the first receipt for a pair creates it (preferred when the product
    /// has no other supplier), later receipts append to its history.
    ///
    /// ## Errors
    /// - `NotFound` if the product does not exist (nothing is written)
    /// - `UniqueViolation` if a concurrent receipt created the same ledger
    ///   first (nothing is written; retrying appends instead)
    pub async fn apply_receipt_line(
        &self,
        order: &PurchaseOrder,
        index: usize,
        item: &PurchaseOrderItem,
        update_prices: bool,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let company_id = &order.company_id;
        let orders = collections::purchase_orders(company_id);
        let claim = format!("l{}", index);
        let mut batch = self.store.batch();
        batch.merge_where(
            &orders,
            &order.id,
            Filter::eq(format!("lineClaims.{}", claim), FieldValue::Null),
            json!({ "lineClaims": { claim: true } }),
        );

        if let Some(product_id) = &item.product_id {
            let products = collections::products(company_id);
            let _product: Product = self
                .store
                .get_required(&products, product_id, "Product")
                .await?;

            batch.increment(&products, product_id, "stock", item.quantity);

            let movement_id = Uuid::new_v4().to_string();
            let movement = StockMovement {
                id: movement_id.clone(),
                product_id: product_id.clone(),
                movement_type: MovementType::In,
                quantity: item.quantity,
                reason: format!(
                    "Purchase order {} from {}",
                    order.order_number, order.supplier_name
                ),
                purchase_order_id: Some(order.id.clone()),
                supplier_id: Some(order.supplier_id.clone()),
                supplier_name: Some(order.supplier_name.clone()),
                created_at: now,
            };
            batch.create(
                &collections::movements(company_id, product_id),
                &movement_id,
                &movement,
            )?;

            if let (true, Some(price)) = (update_prices, item.unit_price) {
                let prices = collections::supplier_prices(company_id, product_id);
                let existing: Option<SupplierPrice> =
                    self.store.get(&prices, &order.supplier_id).await?;
                let entry = next_history_entry(existing.as_ref(), price, now, &order.id);

                match existing {
                    Some(_) => {
                        batch.append(
                            &prices,
                            &order.supplier_id,
                            "priceHistory",
                            serde_json::to_value(&entry)?,
                        );
                        batch.merge(
                            &prices,
                            &order.supplier_id,
                            json!({
                                "purchasePrice": price,
                                "lastPurchasePrice": price,
                                "lastPurchaseDate": now,
                                "supplierName": order.supplier_name,
                                "updatedAt": now,
                            }),
                        );
                    }
                    None => {
                        let others: Vec<SupplierPrice> = self.store.query(&prices, &[]).await?;
                        let ledger = SupplierPrice {
                            id: order.supplier_id.clone(),
                            product_id: product_id.clone(),
                            supplier_id: order.supplier_id.clone(),
                            supplier_name: order.supplier_name.clone(),
                            purchase_price: price,
                            last_purchase_price: Some(price),
                            last_purchase_date: Some(now),
                            price_history: vec![entry],
                            is_preferred: others.is_empty(),
                            created_at: now,
                            updated_at: now,
                        };
                        batch.create(&prices, &order.supplier_id, &ledger)?;
                    }
                }
            }
        }

        batch.append(&orders, &order.id, "receivedLines", json!(index));

        match batch.commit().await {
            Ok(()) => {}
            Err(DbError::PreconditionFailed { .. }) => {
                debug!(order_id = %order.id, line = index, "Receipt line already applied");
                return Ok(false);
            }
            Err(DbError::UniqueViolation { .. }) => {
                return Err(DbError::duplicate(
                    "supplierPrice",
                    format!("{}/{}", item.product_id.as_deref().unwrap_or("-"), order.supplier_id),
                ))
            }
            Err(other) => return Err(other),
        }

        info!(
            order_id = %order.id,
            line = index,
            product_id = ?item.product_id,
            quantity = item.quantity,
            update_prices,
            "Receipt line applied"
        );
        Ok(true)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
