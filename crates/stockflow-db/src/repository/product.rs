//! # Product Repository
//!
//! Products and their movement sub-ledger.
//!
//! `stock` is only ever changed together with a movement (see
//! [`PurchaseOrderRepository::apply_receipt_line`]), so it equals the net
//! sum of the movements.
//!
//! [`PurchaseOrderRepository::apply_receipt_line`]: crate::repository::PurchaseOrderRepository::apply_receipt_line

use tracing::debug;

use crate::collections;
use crate::error::DbResult;
use crate::store::DocumentStore;
use stockflow_core::{Product, StockMovement};

/// Repository for products.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    store: DocumentStore,
}

impl ProductRepository {
    pub fn new(store: DocumentStore) -> Self {
        ProductRepository { store }
    }

    pub async fn get(&self, company_id: &str, product_id: &str) -> DbResult<Option<Product>> {
        self.store
            .get(&collections::products(company_id), product_id)
            .await
    }

    pub async fn get_required(&self, company_id: &str, product_id: &str) -> DbResult<Product> {
        self.store
            .get_required(&collections::products(company_id), product_id, "Product")
            .await
    }

    pub async fn list(&self, company_id: &str) -> DbResult<Vec<Product>> {
        self.store
            .query(&collections::products(company_id), &[])
            .await
    }

    /// Writes a product document (create or replace).
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(product_id = %product.id, name = %product.name, "Saving product");
        self.store
            .set(&collections::products(&product.company_id), &product.id, product)
            .await
    }

    /// The movement sub-ledger, oldest first.
    pub async fn movements(&self, company_id: &str, product_id: &str) -> DbResult<Vec<StockMovement>> {
        self.store
            .query(&collections::movements(company_id, product_id), &[])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::Utc;

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();
        let product = Product {
            id: "p-1".to_string(),
            company_id: "c-1".to_string(),
            name: "Widget".to_string(),
            sku: Some("WID-1".to_string()),
            stock: 4,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();

        let found = db.products().get_required("c-1", "p-1").await.unwrap();
        assert_eq!(found.stock, 4);
        assert!(db.products().get("c-2", "p-1").await.unwrap().is_none());
        assert!(db.products().get_required("c-1", "nope").await.unwrap_err().is_not_found());
        assert_eq!(db.products().list("c-1").await.unwrap().len(), 1);
        assert!(db.products().movements("c-1", "p-1").await.unwrap().is_empty());
    }
}
