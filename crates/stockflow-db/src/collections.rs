//! # Collection Paths
//!
//! Where each entity lives in the document store.
//!
//! ```text
//! companies/{companyId}/purchaseOrders
//! companies/{companyId}/products
//! companies/{companyId}/products/{productId}/supplierPrices   (id = supplierId)
//! companies/{companyId}/products/{productId}/movements
//! promoCodes
//! payments
//! companies
//! users
//! ```

pub const COMPANIES: &str = "companies";
pub const USERS: &str = "users";
pub const PROMO_CODES: &str = "promoCodes";
pub const PAYMENTS: &str = "payments";

pub fn purchase_orders(company_id: &str) -> String {
    format!("{}/{}/purchaseOrders", COMPANIES, company_id)
}

pub fn products(company_id: &str) -> String {
    format!("{}/{}/products", COMPANIES, company_id)
}

pub fn supplier_prices(company_id: &str, product_id: &str) -> String {
    format!("{}/{}/supplierPrices", products(company_id), product_id)
}

pub fn movements(company_id: &str, product_id: &str) -> String {
    format!("{}/{}/movements", products(company_id), product_id)
}
