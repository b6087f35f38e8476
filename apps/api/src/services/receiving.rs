//! # Purchase Order Receiving
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  receive_purchase_order(order, decision?)                               │
//! │                                                                         │
//! │  ordered/pending ──► price_diffs ──┬── diffs, no decision ──► 409       │
//! │                                    │   { confirmation_required, diffs } │
//! │                                    ▼                                    │
//! │                     begin_receiving (CAS, records decision)            │
//! │                                    │                                    │
//! │  receiving (interrupted) ──────────┤                                    │
//! │                                    ▼                                    │
//! │              apply_receipt_line × pending lines                        │
//! │              (claim + stock + movement + ledger, one batch;            │
//! │               a line claimed by a concurrent call is skipped)          │
//! │                                    │                                    │
//! │                                    ▼                                    │
//! │                     finish_receiving ──► received                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failure part-way leaves the order in `receiving` with the applied
//! lines recorded. Calling receive again finishes the remaining lines with
//! the decision that was recorded the first time.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::error::{ApiError, ApiResult};
use stockflow_core::purchasing::{
    pending_lines, plan_receipt, price_diffs, receive_stage, PriceDecision, PriceDiff,
    ReceivePlan, ReceiveStage,
};
use stockflow_core::{PurchaseOrder, PurchaseOrderStatus};
use stockflow_db::Database;

/// Result of a receive call.
#[derive(Debug, Clone)]
pub enum ReceiveOutcome {
    Received(PurchaseOrder),
    /// Prices differ from the ledger; call again with a decision.
    ConfirmationRequired(Vec<PriceDiff>),
}

/// Price diffs of an order against its supplier's ledger, without
/// receiving anything.
pub async fn check_price_changes(
    db: &Database,
    company_id: &str,
    order_id: &str,
) -> ApiResult<Vec<PriceDiff>> {
    let order = db.purchase_orders().get_required(company_id, order_id).await?;
    let ledgers = db.supplier_prices().for_order(&order).await?;
    Ok(price_diffs(&order, &ledgers))
}

pub async fn receive_purchase_order(
    db: &Database,
    company_id: &str,
    order_id: &str,
    decision: Option<PriceDecision>,
    now: DateTime<Utc>,
) -> ApiResult<ReceiveOutcome> {
    let repo = db.purchase_orders();
    let mut order = repo.get_required(company_id, order_id).await?;

    let update_prices = match receive_stage(&order)? {
        ReceiveStage::Fresh => {
            let ledgers = db.supplier_prices().for_order(&order).await?;
            let diffs = price_diffs(&order, &ledgers);
            debug!(order_id, diffs = diffs.len(), "Price check before receipt");

            let update_prices = match plan_receipt(diffs, decision) {
                ReceivePlan::AwaitDecision(diffs) => {
                    info!(order_id, diffs = diffs.len(), "Price confirmation required");
                    return Ok(ReceiveOutcome::ConfirmationRequired(diffs));
                }
                ReceivePlan::Proceed { update_prices } => update_prices,
            };

            if !repo.begin_receiving(&order, update_prices, now).await? {
                return Err(ApiError::conflict(format!(
                    "Purchase order {} is already being received",
                    order_id
                )));
            }
            order = repo.get_required(company_id, order_id).await?;
            update_prices
        }
        ReceiveStage::Resume { update_prices } => {
            warn!(
                order_id,
                applied = order.received_lines.len(),
                total = order.items.len(),
                "Resuming interrupted receipt"
            );
            update_prices
        }
    };

    let pending: Vec<_> = pending_lines(&order)
        .map(|(index, item)| (index, item.clone()))
        .collect();

    let mut applied = 0;
    for (index, item) in &pending {
        match repo
            .apply_receipt_line(&order, *index, item, update_prices, now)
            .await
        {
            Ok(true) => applied += 1,
            Ok(false) => {}
            Err(e) => {
                error!(order_id, line = index, error = %e, "Receipt line failed; order left in receiving");
                return Err(e.into());
            }
        }
    }

    if !repo.finish_receiving(&order, now).await? {
        // Every line is claimed, so a concurrent call may have finished first
        let current = repo.get_required(company_id, order_id).await?;
        if current.status != PurchaseOrderStatus::Received {
            return Err(ApiError::conflict(format!(
                "Purchase order {} changed while receiving",
                order_id
            )));
        }
        debug!(order_id, "Receipt finished by a concurrent call");
        return Ok(ReceiveOutcome::Received(current));
    }

    info!(
        order_id,
        lines = applied,
        skipped = pending.len() - applied,
        update_prices,
        "Purchase order received"
    );
    Ok(ReceiveOutcome::Received(
        repo.get_required(company_id, order_id).await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::purchase_orders::{create_purchase_order, CreatePurchaseOrderInput};
    use crate::test_support::{database, line, now, seed_product, COMPANY, SUPPLIER};
    use stockflow_core::{Money, PurchaseOrderItem};

    async fn order(db: &Database, items: Vec<PurchaseOrderItem>) -> PurchaseOrder {
        create_purchase_order(
            db,
            COMPANY,
            CreatePurchaseOrderInput {
                supplier_id: SUPPLIER.to_string(),
                supplier_name: "Distribuidora Norte".to_string(),
                items,
                expected_date: None,
                notes: None,
                draft: false,
            },
            now(),
        )
        .await
        .unwrap()
    }

    fn received(outcome: ReceiveOutcome) -> PurchaseOrder {
        match outcome {
            ReceiveOutcome::Received(order) => order,
            other => panic!("expected Received, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_new_prices_need_confirmation() {
        let db = database().await;
        seed_product(&db, "p-1", 0).await;
        let po = order(&db, vec![line(Some("p-1"), 10, Some(500))]).await;

        let outcome = receive_purchase_order(&db, COMPANY, &po.id, None, now())
            .await
            .unwrap();
        let ReceiveOutcome::ConfirmationRequired(diffs) = outcome else {
            panic!("expected confirmation");
        };
        assert_eq!(diffs.len(), 1);
        assert!(diffs[0].is_new);

        // Nothing was written
        let product = db.products().get_required(COMPANY, "p-1").await.unwrap();
        assert_eq!(product.stock, 0);
        let po = db.purchase_orders().get_required(COMPANY, &po.id).await.unwrap();
        assert_eq!(po.status, PurchaseOrderStatus::Ordered);
    }

    #[tokio::test]
    async fn test_update_prices_creates_ledger() {
        let db = database().await;
        seed_product(&db, "p-1", 2).await;
        let po = order(
            &db,
            vec![line(Some("p-1"), 10, Some(500)), line(None, 1, Some(99))],
        )
        .await;

        let po = received(
            receive_purchase_order(&db, COMPANY, &po.id, Some(PriceDecision::UpdatePrices), now())
                .await
                .unwrap(),
        );
        assert_eq!(po.status, PurchaseOrderStatus::Received);
        assert_eq!(po.received_lines.len(), 2);

        let product = db.products().get_required(COMPANY, "p-1").await.unwrap();
        assert_eq!(product.stock, 12);
        let movements = db.products().movements(COMPANY, "p-1").await.unwrap();
        assert_eq!(movements.len(), 1);

        let ledger = db
            .supplier_prices()
            .get(COMPANY, "p-1", SUPPLIER)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ledger.current_price(), Money::from_cents(500));
        assert!(ledger.is_preferred);
        assert_eq!(ledger.price_history.len(), 1);
    }

    #[tokio::test]
    async fn test_keep_prices_leaves_ledger() {
        let db = database().await;
        seed_product(&db, "p-1", 0).await;
        let po = order(&db, vec![line(Some("p-1"), 3, Some(500))]).await;

        received(
            receive_purchase_order(&db, COMPANY, &po.id, Some(PriceDecision::KeepPrices), now())
                .await
                .unwrap(),
        );

        let product = db.products().get_required(COMPANY, "p-1").await.unwrap();
        assert_eq!(product.stock, 3);
        let ledger = db.supplier_prices().get(COMPANY, "p-1", SUPPLIER).await.unwrap();
        assert!(ledger.is_none());
    }

    #[tokio::test]
    async fn test_unchanged_prices_receive_without_decision() {
        let db = database().await;
        seed_product(&db, "p-1", 0).await;
        let first = order(&db, vec![line(Some("p-1"), 1, Some(500))]).await;
        received(
            receive_purchase_order(&db, COMPANY, &first.id, Some(PriceDecision::UpdatePrices), now())
                .await
                .unwrap(),
        );

        let second = order(&db, vec![line(Some("p-1"), 4, Some(500))]).await;
        assert!(check_price_changes(&db, COMPANY, &second.id)
            .await
            .unwrap()
            .is_empty());

        received(
            receive_purchase_order(&db, COMPANY, &second.id, None, now())
                .await
                .unwrap(),
        );
        let ledger = db
            .supplier_prices()
            .get(COMPANY, "p-1", SUPPLIER)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ledger.price_history.len(), 2);
        assert_eq!(
            ledger.price_history[1].previous_price,
            Some(Money::from_cents(500))
        );
    }

    #[tokio::test]
    async fn test_second_receive_is_refused() {
        let db = database().await;
        seed_product(&db, "p-1", 0).await;
        let po = order(&db, vec![line(Some("p-1"), 5, Some(100))]).await;
        received(
            receive_purchase_order(&db, COMPANY, &po.id, Some(PriceDecision::KeepPrices), now())
                .await
                .unwrap(),
        );

        let err = receive_purchase_order(&db, COMPANY, &po.id, Some(PriceDecision::KeepPrices), now())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);

        let product = db.products().get_required(COMPANY, "p-1").await.unwrap();
        assert_eq!(product.stock, 5);
    }

    #[tokio::test]
    async fn test_resume_after_missing_product() {
        let db = database().await;
        seed_product(&db, "p-1", 0).await;
        let po = order(
            &db,
            vec![line(Some("p-1"), 2, Some(100)), line(Some("p-2"), 3, Some(200))],
        )
        .await;

        // p-2 does not exist yet: the first line lands, the second fails
        let err = receive_purchase_order(&db, COMPANY, &po.id, Some(PriceDecision::UpdatePrices), now())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let stuck = db.purchase_orders().get_required(COMPANY, &po.id).await.unwrap();
        assert_eq!(stuck.status, PurchaseOrderStatus::Receiving);
        assert_eq!(stuck.received_lines, vec![0]);

        seed_product(&db, "p-2", 0).await;
        let done = received(
            receive_purchase_order(&db, COMPANY, &po.id, None, now())
                .await
                .unwrap(),
        );
        assert_eq!(done.status, PurchaseOrderStatus::Received);

        // First line was not applied twice; recorded decision still updates prices
        let p1 = db.products().get_required(COMPANY, "p-1").await.unwrap();
        assert_eq!(p1.stock, 2);
        let p2 = db.products().get_required(COMPANY, "p-2").await.unwrap();
        assert_eq!(p2.stock, 3);
        assert!(db
            .supplier_prices()
            .get(COMPANY, "p-2", SUPPLIER)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_concurrent_resumes_apply_each_line_once() {
        let db = database().await;
        seed_product(&db, "p-1", 0).await;
        seed_product(&db, "p-2", 0).await;
        let po = order(
            &db,
            vec![line(Some("p-1"), 10, Some(500)), line(Some("p-2"), 4, Some(250))],
        )
        .await;
        // Left in receiving by an earlier call that never applied a line
        assert!(db
            .purchase_orders()
            .begin_receiving(&po, false, now())
            .await
            .unwrap());

        let (a, b) = tokio::join!(
            receive_purchase_order(&db, COMPANY, &po.id, None, now()),
            receive_purchase_order(&db, COMPANY, &po.id, None, now()),
        );
        // A call that starts after the other finished is refused as received
        let mut finished = 0;
        for result in [a, b] {
            match result {
                Ok(outcome) => {
                    assert_eq!(received(outcome).status, PurchaseOrderStatus::Received);
                    finished += 1;
                }
                Err(err) => assert_eq!(err.code, ErrorCode::Conflict),
            }
        }
        assert!(finished >= 1);

        let p1 = db.products().get_required(COMPANY, "p-1").await.unwrap();
        assert_eq!(p1.stock, 10);
        let p2 = db.products().get_required(COMPANY, "p-2").await.unwrap();
        assert_eq!(p2.stock, 4);
        assert_eq!(db.products().movements(COMPANY, "p-1").await.unwrap().len(), 1);
        assert_eq!(db.products().movements(COMPANY, "p-2").await.unwrap().len(), 1);

        let mut lines = db
            .purchase_orders()
            .get_required(COMPANY, &po.id)
            .await
            .unwrap()
            .received_lines;
        lines.sort_unstable();
        assert_eq!(lines, vec![0, 1]);
    }

    #[tokio::test]
    async fn test_cancelled_order_cannot_be_received() {
        let db = database().await;
        let po = order(&db, vec![line(None, 1, None)]).await;
        crate::services::purchase_orders::cancel_purchase_order(&db, COMPANY, &po.id, now())
            .await
            .unwrap();

        let err = receive_purchase_order(&db, COMPANY, &po.id, None, now())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
    }
}
