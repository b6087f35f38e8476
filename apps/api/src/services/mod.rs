//! # Services
//!
//! Business operations behind the HTTP routes. Each takes the database
//! (and the gateway where it needs one) explicitly and returns
//! [`ApiResult`](crate::error::ApiResult).
//!
//! ```text
//! services/
//! ├── mod.rs              ◄─── You are here (exports)
//! ├── purchase_orders.rs  ◄─── Create, list, cancel, delete
//! ├── receiving.rs        ◄─── Price check + resumable receipt
//! ├── supplier_prices.rs  ◄─── Ledgers, preferred supplier
//! ├── promo.rs            ◄─── Promo admin, validation, pricing
//! ├── payment.rs          ◄─── MB WAY / Multibanco creation
//! ├── webhook.rs          ◄─── Signed gateway callbacks
//! └── subscription.rs     ◄─── Activation on paid
//! ```

pub mod payment;
pub mod promo;
pub mod purchase_orders;
pub mod receiving;
pub mod subscription;
pub mod supplier_prices;
pub mod webhook;
