//! # Repository Module
//!
//! Typed access to each collection of the document store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Service (apps/api)                                                    │
//! │       │                                                                 │
//! │       │  db.purchase_orders().get_required(company_id, order_id)       │
//! │       ▼                                                                 │
//! │  PurchaseOrderRepository                                               │
//! │  ├── knows the collection path                                         │
//! │  ├── knows the camelCase field names                                   │
//! │  └── composes atomic batches (receipt lines, preferred supplier)       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DocumentStore (get / query / merge / batch)                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`PurchaseOrderRepository`] - Orders and the per-line receipt batch
//! - [`ProductRepository`] - Products and their movement sub-ledger
//! - [`SupplierPriceRepository`] - Price ledgers and the preferred flag
//! - [`PromoCodeRepository`] - Promo codes by code, usage counter
//! - [`PaymentRepository`] - Payments, gateway-id lookup, guarded transitions
//! - [`CompanyRepository`] - Tenants and subscription state
//! - [`UserRepository`] - Account holders

pub mod company;
pub mod payment;
pub mod product;
pub mod promo_code;
pub mod purchase_order;
pub mod supplier_price;
pub mod user;

pub use company::{CompanyRepository, CompanyTarget, SubscriptionActivation};
pub use payment::PaymentRepository;
pub use product::ProductRepository;
pub use promo_code::PromoCodeRepository;
pub use purchase_order::PurchaseOrderRepository;
pub use supplier_price::SupplierPriceRepository;
pub use user::UserRepository;
