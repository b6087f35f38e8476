//! Purchase order lifecycle: create, read, cancel, delete.
//!
//! Receiving lives in [`crate::services::receiving`].

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use stockflow_core::purchasing::{
    ensure_cancellable, ensure_deletable, generate_order_number, order_total,
};
use stockflow_core::validation::{validate_name, validate_order_items, validate_required};
use stockflow_core::{PurchaseOrder, PurchaseOrderItem, PurchaseOrderStatus};
use stockflow_db::Database;

/// Body of `POST /companies/{companyId}/purchase-orders`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchaseOrderInput {
    pub supplier_id: String,
    pub supplier_name: String,
    pub items: Vec<PurchaseOrderItem>,
    #[serde(default)]
    pub expected_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Save as `pending` instead of sending it (`ordered`).
    #[serde(default)]
    pub draft: bool,
}

pub async fn create_purchase_order(
    db: &Database,
    company_id: &str,
    input: CreatePurchaseOrderInput,
    now: DateTime<Utc>,
) -> ApiResult<PurchaseOrder> {
    validate_required("companyId", company_id)?;
    validate_required("supplierId", &input.supplier_id)?;
    validate_name("supplierName", &input.supplier_name)?;
    validate_order_items(&input.items)?;

    let order = PurchaseOrder {
        id: Uuid::new_v4().to_string(),
        company_id: company_id.to_string(),
        order_number: generate_order_number(now),
        supplier_id: input.supplier_id.trim().to_string(),
        supplier_name: input.supplier_name.trim().to_string(),
        order_date: now,
        expected_date: input.expected_date,
        total: order_total(&input.items)?,
        items: input.items,
        status: if input.draft {
            PurchaseOrderStatus::Pending
        } else {
            PurchaseOrderStatus::Ordered
        },
        received_date: None,
        receiving_started_at: None,
        update_prices: None,
        received_lines: Vec::new(),
        notes: input.notes,
        created_at: now,
        updated_at: now,
    };

    db.purchase_orders().insert(&order).await?;
    info!(
        order_id = %order.id,
        order_number = %order.order_number,
        total = %order.total,
        "Purchase order created"
    );
    Ok(order)
}

pub async fn list_purchase_orders(
    db: &Database,
    company_id: &str,
    status: Option<PurchaseOrderStatus>,
) -> ApiResult<Vec<PurchaseOrder>> {
    Ok(db.purchase_orders().list(company_id, status).await?)
}

pub async fn get_purchase_order(db: &Database, company_id: &str, order_id: &str) -> ApiResult<PurchaseOrder> {
    Ok(db.purchase_orders().get_required(company_id, order_id).await?)
}

/// pending/ordered → cancelled.
pub async fn cancel_purchase_order(
    db: &Database,
    company_id: &str,
    order_id: &str,
    now: DateTime<Utc>,
) -> ApiResult<PurchaseOrder> {
    let repo = db.purchase_orders();
    let order = repo.get_required(company_id, order_id).await?;
    ensure_cancellable(&order)?;

    if !repo.cancel(&order, now).await? {
        return Err(ApiError::conflict(format!(
            "Purchase order {} changed while cancelling",
            order_id
        )));
    }

    info!(order_id, "Purchase order cancelled");
    Ok(repo.get_required(company_id, order_id).await?)
}

/// Deletes an order that has no receipt work on it.
pub async fn delete_purchase_order(db: &Database, company_id: &str, order_id: &str) -> ApiResult<()> {
    let repo = db.purchase_orders();
    let order = repo.get_required(company_id, order_id).await?;
    ensure_deletable(&order)?;

    repo.delete(company_id, order_id).await?;
    info!(order_id, "Purchase order deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use stockflow_core::Money;
    use stockflow_db::DbConfig;

    fn input(items: Vec<PurchaseOrderItem>) -> CreatePurchaseOrderInput {
        CreatePurchaseOrderInput {
            supplier_id: "sup-norte".to_string(),
            supplier_name: "Distribuidora Norte".to_string(),
            items,
            expected_date: None,
            notes: None,
            draft: false,
        }
    }

    fn line(product_id: &str, qty: i64, cents: i64) -> PurchaseOrderItem {
        PurchaseOrderItem {
            product_id: Some(product_id.to_string()),
            product_name: format!("Product {}", product_id),
            quantity: qty,
            unit_price: Some(Money::from_cents(cents)),
        }
    }

    #[tokio::test]
    async fn test_create_computes_total_and_number() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let order = create_purchase_order(
            &db,
            "c-1",
            input(vec![line("p-1", 10, 500), line("p-2", 2, 125)]),
            Utc::now(),
        )
        .await
        .unwrap();

        assert_eq!(order.total, Money::from_cents(5250));
        assert_eq!(order.status, PurchaseOrderStatus::Ordered);
        assert!(order.order_number.starts_with("PO-"));

        let listed = list_purchase_orders(&db, "c-1", Some(PurchaseOrderStatus::Ordered))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_items() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = create_purchase_order(&db, "c-1", input(vec![]), Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_create_rejects_oversized_amounts() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = create_purchase_order(
            &db,
            "c-1",
            input(vec![line("p-1", 1_000_000, 10_000_000_000_000)]),
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        assert!(list_purchase_orders(&db, "c-1", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_then_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let order = create_purchase_order(&db, "c-1", input(vec![line("p-1", 1, 100)]), Utc::now())
            .await
            .unwrap();

        let cancelled = cancel_purchase_order(&db, "c-1", &order.id, Utc::now()).await.unwrap();
        assert_eq!(cancelled.status, PurchaseOrderStatus::Cancelled);

        let err = cancel_purchase_order(&db, "c-1", &order.id, Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);

        delete_purchase_order(&db, "c-1", &order.id).await.unwrap();
        let err = get_purchase_order(&db, "c-1", &order.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
