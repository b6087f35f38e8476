//! Supplier price ledgers per product.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ApiResult;
use stockflow_core::validation::validate_required;
use stockflow_core::{Money, SupplierPrice};
use stockflow_db::Database;

/// A ledger with its derived current price.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPriceView {
    #[serde(flatten)]
    pub ledger: SupplierPrice,
    pub current_price: Money,
}

impl From<SupplierPrice> for SupplierPriceView {
    fn from(ledger: SupplierPrice) -> Self {
        SupplierPriceView {
            current_price: ledger.current_price(),
            ledger,
        }
    }
}

pub async fn list_supplier_prices(
    db: &Database,
    company_id: &str,
    product_id: &str,
) -> ApiResult<Vec<SupplierPriceView>> {
    db.products().get_required(company_id, product_id).await?;

    let mut ledgers = db.supplier_prices().list(company_id, product_id).await?;
    ledgers.sort_by(|a, b| {
        b.is_preferred
            .cmp(&a.is_preferred)
            .then_with(|| a.supplier_name.cmp(&b.supplier_name))
    });
    Ok(ledgers.into_iter().map(SupplierPriceView::from).collect())
}

/// Makes one supplier the preferred source of a product and returns the
/// updated ledgers.
pub async fn set_preferred_supplier(
    db: &Database,
    company_id: &str,
    product_id: &str,
    supplier_id: &str,
    now: DateTime<Utc>,
) -> ApiResult<Vec<SupplierPriceView>> {
    validate_required("supplierId", supplier_id)?;
    db.supplier_prices()
        .set_preferred(company_id, product_id, supplier_id, now)
        .await?;
    list_supplier_prices(db, company_id, product_id).await
}
