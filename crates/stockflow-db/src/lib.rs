//! # stockflow-db: Document Store for Stockflow
//!
//! Implements the document-store contract (get, query, add, merge, delete,
//! plus atomic increment/append, compare-and-set and write batches) on
//! SQLite, and typed repositories on top of it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockflow Data Flow                              │
//! │                                                                         │
//! │  apps/api service (receive_purchase_order, handle_webhook, ...)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  stockflow-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ PurchaseOrder  │   │  (embedded)  │  │   │
//! │  │   │               │◄───│ SupplierPrice  │   │ 001_docs.sql │  │   │
//! │  │   │ DocumentStore │    │ Payment, Promo │   │              │  │   │
//! │  │   │ (store.rs)    │    │ Company, User  │   │              │  │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite: documents(collection, id, data JSON, created_at, updated_at)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`store`] - The document store and write batches
//! - [`collections`] - Collection path builders
//! - [`repository`] - Typed repositories per collection
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockflow_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./stockflow.db")).await?;
//! let order = db.purchase_orders().get_required(&company_id, &order_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod collections;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use store::{DocumentStore, FieldValue, Filter, WriteBatch};

pub use repository::{
    CompanyRepository, CompanyTarget, PaymentRepository, ProductRepository, PromoCodeRepository,
    PurchaseOrderRepository, SubscriptionActivation, SupplierPriceRepository, UserRepository,
};
