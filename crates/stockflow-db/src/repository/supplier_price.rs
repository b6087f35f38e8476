//! # Supplier Price Repository
//!
//! Read side of the price ledger, plus the preferred-supplier switch.
//! Ledger writes happen inside receipt batches
//! (`PurchaseOrderRepository::apply_receipt_line`).

use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::HashMap;
use tracing::info;

use crate::collections;
use crate::error::{DbError, DbResult};
use crate::store::DocumentStore;
use stockflow_core::{PurchaseOrder, SupplierPrice};

/// Repository for per-product supplier price ledgers.
#[derive(Debug, Clone)]
pub struct SupplierPriceRepository {
    store: DocumentStore,
}

impl SupplierPriceRepository {
    pub fn new(store: DocumentStore) -> Self {
        SupplierPriceRepository { store }
    }

    pub async fn get(
        &self,
        company_id: &str,
        product_id: &str,
        supplier_id: &str,
    ) -> DbResult<Option<SupplierPrice>> {
        self.store
            .get(&collections::supplier_prices(company_id, product_id), supplier_id)
            .await
    }

    /// Every supplier's ledger for one product.
    pub async fn list(&self, company_id: &str, product_id: &str) -> DbResult<Vec<SupplierPrice>> {
        self.store
            .query(&collections::supplier_prices(company_id, product_id), &[])
            .await
    }

    /// Ledgers of the order's supplier for each priced product on the order,
    /// keyed by product id. Products without a ledger are absent.
    pub async fn for_order(&self, order: &PurchaseOrder) -> DbResult<HashMap<String, SupplierPrice>> {
        let mut ledgers = HashMap::new();

        for item in &order.items {
            let Some(product_id) = &item.product_id else {
                continue;
            };
            if item.unit_price.is_none() || ledgers.contains_key(product_id) {
                continue;
            }
            if let Some(ledger) = self
                .get(&order.company_id, product_id, &order.supplier_id)
                .await?
            {
                ledgers.insert(product_id.clone(), ledger);
            }
        }

        Ok(ledgers)
    }

    /// Makes `supplier_id` the only preferred supplier of a product.
    ///
    /// Unset and set happen in one batch, so readers never see two
    /// preferred suppliers (or none, when one existed).
    pub async fn set_preferred(
        &self,
        company_id: &str,
        product_id: &str,
        supplier_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let path = collections::supplier_prices(company_id, product_id);
        let ledgers = self.list(company_id, product_id).await?;

        if !ledgers.iter().any(|l| l.supplier_id == supplier_id) {
            return Err(DbError::not_found("SupplierPrice", supplier_id));
        }

        let mut batch = self.store.batch();
        for ledger in ledgers
            .iter()
            .filter(|l| l.is_preferred && l.supplier_id != supplier_id)
        {
            batch.merge(
                &path,
                &ledger.id,
                json!({"isPreferred": false, "updatedAt": now}),
            );
        }
        batch.merge(
            &path,
            supplier_id,
            json!({"isPreferred": true, "updatedAt": now}),
        );
        batch.commit().await?;

        info!(product_id, supplier_id, "Preferred supplier set");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use stockflow_core::Money;

    fn ledger(product_id: &str, supplier_id: &str, preferred: bool) -> SupplierPrice {
        let now = Utc::now();
        SupplierPrice {
            id: supplier_id.to_string(),
            product_id: product_id.to_string(),
            supplier_id: supplier_id.to_string(),
            supplier_name: format!("Supplier {}", supplier_id),
            purchase_price: Money::from_cents(100),
            last_purchase_price: None,
            last_purchase_date: None,
            price_history: vec![],
            is_preferred: preferred,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_set_preferred_is_exclusive() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store = db.documents();
        let path = collections::supplier_prices("c-1", "p-1");
        for (supplier, preferred) in [("a", true), ("b", false), ("c", false)] {
            store
                .set(&path, supplier, &ledger("p-1", supplier, preferred))
                .await
                .unwrap();
        }

        let repo = db.supplier_prices();
        repo.set_preferred("c-1", "p-1", "b", Utc::now()).await.unwrap();

        let preferred: Vec<String> = repo
            .list("c-1", "p-1")
            .await
            .unwrap()
            .into_iter()
            .filter(|l| l.is_preferred)
            .map(|l| l.supplier_id)
            .collect();
        assert_eq!(preferred, vec!["b".to_string()]);

        let missing = repo.set_preferred("c-1", "p-1", "zzz", Utc::now()).await;
        assert!(matches!(missing, Err(DbError::NotFound { .. })));
    }
}
