//! # HTTP Routes
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET    /health                                                         │
//! │                                                                         │
//! │  /companies/{companyId}/purchase-orders                                 │
//! │    POST   /                          create                             │
//! │    GET    /                          list (?status=)                    │
//! │    GET    /{orderId}                 get                                │
//! │    DELETE /{orderId}                 delete                             │
//! │    POST   /{orderId}/cancel          cancel                             │
//! │    GET    /{orderId}/price-changes   price diffs                        │
//! │    POST   /{orderId}/receive         receive (409 until decided)        │
//! │                                                                         │
//! │  /companies/{companyId}/products/{productId}                            │
//! │    GET    /supplier-prices                                              │
//! │    PUT    /preferred-supplier                                           │
//! │                                                                         │
//! │  POST /promo-codes, /promo-codes/validate, /promo-codes/{id}/deactivate │
//! │  POST /payments/mbway, /payments/multibanco   GET /payments/{id}        │
//! │  POST /webhooks/eupago                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod health;
pub mod payments;
pub mod promo_codes;
pub mod purchase_orders;
pub mod supplier_prices;
pub mod webhook;

use axum::routing::{get, post, put};
use axum::Router;

use crate::state::AppState;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/companies/{company_id}/purchase-orders",
            post(purchase_orders::create).get(purchase_orders::list),
        )
        .route(
            "/companies/{company_id}/purchase-orders/{order_id}",
            get(purchase_orders::get).delete(purchase_orders::delete),
        )
        .route(
            "/companies/{company_id}/purchase-orders/{order_id}/cancel",
            post(purchase_orders::cancel),
        )
        .route(
            "/companies/{company_id}/purchase-orders/{order_id}/price-changes",
            get(purchase_orders::price_changes),
        )
        .route(
            "/companies/{company_id}/purchase-orders/{order_id}/receive",
            post(purchase_orders::receive),
        )
        .route(
            "/companies/{company_id}/products/{product_id}/supplier-prices",
            get(supplier_prices::list),
        )
        .route(
            "/companies/{company_id}/products/{product_id}/preferred-supplier",
            put(supplier_prices::set_preferred),
        )
        .route("/promo-codes", post(promo_codes::create))
        .route("/promo-codes/validate", post(promo_codes::validate))
        .route("/promo-codes/{promo_id}/deactivate", post(promo_codes::deactivate))
        .route("/payments/mbway", post(payments::create_mbway))
        .route("/payments/multibanco", post(payments::create_multibanco))
        .route("/payments/{payment_id}", get(payments::get))
        .route("/webhooks/eupago", post(webhook::eupago))
        .with_state(state)
}
