//! Fixtures shared by service and route tests.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::config::ApiConfig;
use crate::state::AppState;
use stockflow_core::{
    Money, Product, PromoCode, PromoDuration, PromoType, PurchaseOrderItem, User,
};
use stockflow_db::{Database, DbConfig};
use stockflow_gateway::{EupagoClient, GatewayConfig};

pub const COMPANY: &str = "c-1";
pub const SUPPLIER: &str = "sup-norte";
pub const WEBHOOK_SECRET: &str = "whsec_test";

pub async fn database() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

pub async fn seed_product(db: &Database, id: &str, stock: i64) {
    let now = Utc::now();
    db.products()
        .insert(&Product {
            id: id.to_string(),
            company_id: COMPANY.to_string(),
            name: format!("Product {}", id),
            sku: None,
            stock,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();
}

pub async fn seed_user(db: &Database, id: &str, company_id: Option<&str>) {
    db.users()
        .insert(&User {
            id: id.to_string(),
            email: format!("{}@example.pt", id),
            display_name: Some("Ana Costa".to_string()),
            company_id: company_id.map(str::to_string),
            created_at: Utc::now(),
        })
        .await
        .unwrap();
}

pub fn promo(code: &str, promo_type: PromoType, value: i64) -> PromoCode {
    let now = Utc::now();
    PromoCode {
        id: format!("promo-{}", code.to_lowercase()),
        code: code.to_string(),
        promo_type,
        value,
        description: None,
        active: true,
        valid_from: None,
        valid_until: None,
        max_uses: None,
        used_count: 0,
        duration: PromoDuration::Once,
        duration_months: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn line(product_id: Option<&str>, quantity: i64, cents: Option<i64>) -> PurchaseOrderItem {
    PurchaseOrderItem {
        product_id: product_id.map(str::to_string),
        product_name: format!("Product {}", product_id.unwrap_or("free")),
        quantity,
        unit_price: cents.map(Money::from_cents),
    }
}

pub fn gateway(base_url: &str) -> EupagoClient {
    let config = GatewayConfig::new(base_url, "test-key")
        .unwrap()
        .timeout(Duration::from_millis(500))
        .max_retries(1)
        .initial_backoff(Duration::from_millis(10))
        .max_backoff(Duration::from_millis(20));
    EupagoClient::new(config).unwrap()
}

pub fn config(base_url: &str) -> ApiConfig {
    let base_url = base_url.to_string();
    ApiConfig::from_lookup(move |key| match key {
        "EUPAGO_BASE_URL" => Some(base_url.clone()),
        "EUPAGO_API_KEY" => Some("test-key".to_string()),
        "EUPAGO_WEBHOOK_SECRET" => Some(WEBHOOK_SECRET.to_string()),
        _ => None,
    })
    .unwrap()
}

pub async fn app_state(base_url: &str) -> AppState {
    AppState::new(database().await, gateway(base_url), config(base_url))
}

pub fn now() -> DateTime<Utc> {
    Utc::now()
}
