//! Subscription activation for paid payments.

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiResult;
use stockflow_core::{Company, Payment, SubscriptionStatus, User};
use stockflow_db::{CompanyTarget, Database, SubscriptionActivation};

/// Activates (or extends) the subscription a paid payment bought.
///
/// The company is the payment's, else the user's; with neither (or when
/// the referenced company is gone) a new company is created and linked to
/// the user and the payment. Returns false if this payment had already
/// been applied.
pub async fn finalize_paid(db: &Database, payment: &Payment, now: DateTime<Utc>) -> ApiResult<bool> {
    let user = db.users().get_required(&payment.user_id).await?;
    let company_id = payment
        .company_id
        .clone()
        .or_else(|| user.company_id.clone());

    let existing = match &company_id {
        Some(id) => db.companies().get(id).await?,
        None => None,
    };

    let target = match existing {
        Some(company) => CompanyTarget::Existing {
            company_id: company.id,
            patch: json!({
                "subscriptionStatus": SubscriptionStatus::Active,
                "planId": payment.plan_id,
                "lastPaymentDate": now,
                "lastPaymentAmount": payment.amount,
                "updatedAt": now,
            }),
        },
        None => CompanyTarget::New(new_company(
            company_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            &user,
            payment,
            now,
        )),
    };

    let activation = SubscriptionActivation {
        payment_id: payment.id.clone(),
        user_id: user.id.clone(),
        target,
        promo_id: payment.discount.as_ref().map(|d| d.promo_id.clone()),
        activated_at: now,
    };

    let applied = db.companies().activate_subscription(&activation).await?;
    if applied {
        info!(
            payment_id = %payment.id,
            company_id = %activation.target.company_id(),
            plan_id = %payment.plan_id,
            "Subscription active"
        );
    } else {
        debug!(payment_id = %payment.id, "Subscription already applied");
    }
    Ok(applied)
}

fn new_company(id: String, user: &User, payment: &Payment, now: DateTime<Utc>) -> Company {
    let name = match &user.display_name {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => user.email.clone(),
    };

    Company {
        id,
        name,
        owner_id: user.id.clone(),
        plan_id: Some(payment.plan_id.clone()),
        subscription_status: SubscriptionStatus::Active,
        last_payment_date: Some(now),
        last_payment_amount: Some(payment.amount),
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{database, now, seed_user};
    use stockflow_core::{Money, PaymentMethod, PaymentStatus};

    fn paid(user_id: &str, company_id: Option<&str>) -> Payment {
        let now = Utc::now();
        Payment {
            id: "pay-1".to_string(),
            user_id: user_id.to_string(),
            company_id: company_id.map(str::to_string),
            plan_id: "pro".to_string(),
            method: PaymentMethod::Multibanco,
            amount: Money::from_cents(2990),
            original_amount: Money::from_cents(2990),
            discount: None,
            status: PaymentStatus::Paid,
            phone: None,
            gateway_reference: None,
            gateway_id: None,
            entity: None,
            gateway_payload: None,
            webhook_payload: None,
            failure_reason: None,
            paid_at: Some(now),
            subscription_activated_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_creates_company_for_new_customer() {
        let db = database().await;
        seed_user(&db, "u-1", None).await;
        let payment = paid("u-1", None);
        db.payments().insert(&payment).await.unwrap();

        assert!(finalize_paid(&db, &payment, now()).await.unwrap());

        let user = db.users().get_required("u-1").await.unwrap();
        let company_id = user.company_id.unwrap();
        let company = db.companies().get_required(&company_id).await.unwrap();
        assert_eq!(company.name, "Ana Costa");
        assert_eq!(company.owner_id, "u-1");
        assert_eq!(company.subscription_status, SubscriptionStatus::Active);

        let stored = db.payments().get_required("pay-1").await.unwrap();
        assert_eq!(stored.company_id.as_deref(), Some(company_id.as_str()));
        assert!(stored.subscription_activated_at.is_some());

        // Second call for the same payment does nothing
        assert!(!finalize_paid(&db, &stored, now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_extends_users_company() {
        let db = database().await;
        seed_user(&db, "u-1", Some("c-1")).await;
        let start = Utc::now();
        db.companies()
            .insert(&Company {
                id: "c-1".to_string(),
                name: "Mercearia Costa".to_string(),
                owner_id: "u-1".to_string(),
                plan_id: Some("basic".to_string()),
                subscription_status: SubscriptionStatus::PastDue,
                last_payment_date: None,
                last_payment_amount: None,
                created_at: start,
                updated_at: start,
            })
            .await
            .unwrap();
        let payment = paid("u-1", None);
        db.payments().insert(&payment).await.unwrap();

        assert!(finalize_paid(&db, &payment, now()).await.unwrap());

        let company = db.companies().get_required("c-1").await.unwrap();
        assert_eq!(company.name, "Mercearia Costa");
        assert_eq!(company.plan_id.as_deref(), Some("pro"));
        assert_eq!(company.subscription_status, SubscriptionStatus::Active);
        assert_eq!(company.last_payment_amount, Some(Money::from_cents(2990)));
    }
}
