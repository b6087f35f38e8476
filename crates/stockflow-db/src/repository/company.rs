//! # Company Repository
//!
//! Tenants and their subscription state.
//!
//! ## Activation Batch
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  activate_subscription(activation)                                      │
//! │                                                                         │
//! │  ┌──────────────────── one transaction ─────────────────────┐           │
//! │  │ payments/{id}      claim: subscriptionActivatedAt IS NULL │           │
//! │  │ companies/{id}     merge plan + status | create new       │           │
//! │  │ users/{id}         companyId (new company only)           │           │
//! │  │ promoCodes/{id}    usedCount += 1 (discounted payments)   │           │
//! │  └───────────────────────────────────────────────────────────┘           │
//! │                                                                         │
//! │  A second activation for the same payment fails the claim and           │
//! │  writes nothing.                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::info;

use crate::collections::{COMPANIES, PAYMENTS, PROMO_CODES, USERS};
use crate::error::{DbError, DbResult};
use crate::store::{DocumentStore, FieldValue, Filter};
use stockflow_core::Company;

/// Which company a paid subscription lands on.
#[derive(Debug, Clone)]
pub enum CompanyTarget {
    /// Merge the subscription fields into this company.
    Existing { company_id: String, patch: Value },
    /// Create this company and link it from the user.
    New(Company),
}

impl CompanyTarget {
    pub fn company_id(&self) -> &str {
        match self {
            CompanyTarget::Existing { company_id, .. } => company_id,
            CompanyTarget::New(company) => &company.id,
        }
    }
}

/// Everything written when a payment becomes paid.
#[derive(Debug, Clone)]
pub struct SubscriptionActivation {
    pub payment_id: String,
    pub user_id: String,
    pub target: CompanyTarget,
    /// Promo whose `usedCount` the payment redeems.
    pub promo_id: Option<String>,
    pub activated_at: DateTime<Utc>,
}

/// Repository for companies.
#[derive(Debug, Clone)]
pub struct CompanyRepository {
    store: DocumentStore,
}

impl CompanyRepository {
    pub fn new(store: DocumentStore) -> Self {
        CompanyRepository { store }
    }

    pub async fn get(&self, company_id: &str) -> DbResult<Option<Company>> {
        self.store.get(COMPANIES, company_id).await
    }

    pub async fn get_required(&self, company_id: &str) -> DbResult<Company> {
        self.store.get_required(COMPANIES, company_id, "Company").await
    }

    pub async fn insert(&self, company: &Company) -> DbResult<()> {
        self.store.create(COMPANIES, &company.id, company).await
    }

    pub async fn merge(&self, company_id: &str, patch: &Value) -> DbResult<()> {
        self.store.update_merge(COMPANIES, company_id, patch).await
    }

    /// Applies a paid subscription in one batch.
    ///
    /// Returns `Ok(false)` when the payment was already activated; nothing
    /// is written in that case.
    pub async fn activate_subscription(&self, activation: &SubscriptionActivation) -> DbResult<bool> {
        let company_id = activation.target.company_id().to_string();
        let now = activation.activated_at;

        let mut batch = self.store.batch();
        batch.merge_where(
            PAYMENTS,
            &activation.payment_id,
            Filter::eq("subscriptionActivatedAt", FieldValue::Null),
            json!({
                "companyId": company_id,
                "subscriptionActivatedAt": now,
                "updatedAt": now,
            }),
        );

        match &activation.target {
            CompanyTarget::Existing { company_id, patch } => {
                batch.merge(COMPANIES, company_id, patch.clone());
            }
            CompanyTarget::New(company) => {
                batch.create(COMPANIES, &company.id, company)?;
                batch.merge(USERS, &activation.user_id, json!({"companyId": company.id}));
            }
        }

        if let Some(promo_id) = &activation.promo_id {
            batch.increment(PROMO_CODES, promo_id, "usedCount", 1);
        }

        match batch.commit().await {
            Ok(()) => {
                info!(
                    company_id = %company_id,
                    payment_id = %activation.payment_id,
                    created = matches!(activation.target, CompanyTarget::New(_)),
                    "Subscription activated"
                );
                Ok(true)
            }
            Err(DbError::PreconditionFailed { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }
}
