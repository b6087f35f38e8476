//! # Payment Repository
//!
//! Payments are global documents. The webhook path finds them by the
//! gateway's id and moves them out of `pending` with a compare-and-set,
//! so a payment leaves `pending` exactly once however many times the
//! gateway retries.

use serde_json::Value;
use tracing::debug;

use crate::collections::PAYMENTS;
use crate::error::DbResult;
use crate::store::{DocumentStore, Filter};
use stockflow_core::{Payment, PaymentStatus};

/// Repository for payments.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    store: DocumentStore,
}

impl PaymentRepository {
    pub fn new(store: DocumentStore) -> Self {
        PaymentRepository { store }
    }

    pub async fn insert(&self, payment: &Payment) -> DbResult<()> {
        debug!(payment_id = %payment.id, method = %payment.method, "Recording payment");
        self.store.create(PAYMENTS, &payment.id, payment).await
    }

    pub async fn get(&self, payment_id: &str) -> DbResult<Option<Payment>> {
        self.store.get(PAYMENTS, payment_id).await
    }

    pub async fn get_required(&self, payment_id: &str) -> DbResult<Payment> {
        self.store.get_required(PAYMENTS, payment_id, "Payment").await
    }

    /// Finds the payment the gateway knows as `gateway_id`.
    pub async fn find_by_gateway_id(&self, gateway_id: &str) -> DbResult<Option<Payment>> {
        let payments: Vec<Payment> = self
            .store
            .query(PAYMENTS, &[Filter::eq("gatewayId", gateway_id)])
            .await?;
        Ok(payments.into_iter().next())
    }

    pub async fn merge(&self, payment_id: &str, patch: &Value) -> DbResult<()> {
        self.store.update_merge(PAYMENTS, payment_id, patch).await
    }

    /// Merges `patch` only while the payment is still `from`.
    ///
    /// Returns false if another writer moved the payment first.
    pub async fn transition(&self, payment_id: &str, from: PaymentStatus, patch: &Value) -> DbResult<bool> {
        self.store
            .update_where(PAYMENTS, payment_id, &Filter::eq("status", from.as_str()), patch)
            .await
    }
}
