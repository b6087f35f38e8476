//! # Promo Code Repository
//!
//! Promo codes live in one global collection, looked up by their
//! normalized (upper-case) code. Codes are never hard-deleted while
//! payments reference them; deactivation sets `active = false`.

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, info};

use crate::collections::PROMO_CODES;
use crate::error::{DbError, DbResult};
use crate::store::{DocumentStore, Filter};
use stockflow_core::promo::normalize_code;
use stockflow_core::PromoCode;

/// Repository for promo codes.
#[derive(Debug, Clone)]
pub struct PromoCodeRepository {
    store: DocumentStore,
}

impl PromoCodeRepository {
    pub fn new(store: DocumentStore) -> Self {
        PromoCodeRepository { store }
    }

    pub async fn get(&self, promo_id: &str) -> DbResult<Option<PromoCode>> {
        self.store.get(PROMO_CODES, promo_id).await
    }

    pub async fn get_required(&self, promo_id: &str) -> DbResult<PromoCode> {
        self.store.get_required(PROMO_CODES, promo_id, "PromoCode").await
    }

    /// Looks a code up as typed by a user.
    ///
    /// An active match wins over inactive ones (old deactivated codes may
    /// share the string).
    pub async fn find_by_code(&self, code: &str) -> DbResult<Option<PromoCode>> {
        let code = normalize_code(code);
        let mut matches: Vec<PromoCode> = self
            .store
            .query(PROMO_CODES, &[Filter::eq("code", code.as_str())])
            .await?;

        debug!(code = %code, matches = matches.len(), "Promo lookup");

        let active = matches.iter().position(|p| p.active);
        Ok(match active {
            Some(index) => Some(matches.swap_remove(index)),
            None => matches.into_iter().next(),
        })
    }

    /// Stores a new promo. Fails if an active promo already uses the code.
    pub async fn insert(&self, promo: &PromoCode) -> DbResult<()> {
        if let Some(existing) = self.find_by_code(&promo.code).await? {
            if existing.active {
                return Err(DbError::duplicate("code", promo.code.clone()));
            }
        }

        self.store.create(PROMO_CODES, &promo.id, promo).await?;
        info!(promo_id = %promo.id, code = %promo.code, "Promo code created");
        Ok(())
    }

    /// Soft delete.
    pub async fn deactivate(&self, promo_id: &str, now: DateTime<Utc>) -> DbResult<()> {
        self.store
            .update_merge(PROMO_CODES, promo_id, &json!({"active": false, "updatedAt": now}))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use stockflow_core::{PromoDuration, PromoType};

    fn promo(id: &str, code: &str, active: bool) -> PromoCode {
        let now = Utc::now();
        PromoCode {
            id: id.to_string(),
            code: code.to_string(),
            promo_type: PromoType::Percentage,
            value: 1000,
            description: None,
            active,
            valid_from: None,
            valid_until: None,
            max_uses: Some(10),
            used_count: 0,
            duration: PromoDuration::Once,
            duration_months: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_find_by_code_is_case_insensitive_and_prefers_active() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.promo_codes();
        repo.insert(&promo("old", "SUMMER10", false)).await.unwrap();
        repo.insert(&promo("new", "SUMMER10", true)).await.unwrap();

        let found = repo.find_by_code(" summer10 ").await.unwrap().unwrap();
        assert_eq!(found.id, "new");
        assert!(repo.find_by_code("WINTER").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_active_code_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.promo_codes();
        repo.insert(&promo("a", "SPRING", true)).await.unwrap();
        let again = repo.insert(&promo("b", "SPRING", true)).await;
        assert!(matches!(again, Err(DbError::UniqueViolation { .. })));
    }

    #[tokio::test]
    async fn test_deactivate_keeps_usage() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.promo_codes();
        let mut used = promo("a", "SPRING", true);
        used.used_count = 2;
        repo.insert(&used).await.unwrap();

        repo.deactivate("a", Utc::now()).await.unwrap();
        let stored = repo.get_required("a").await.unwrap();
        assert!(!stored.active);
        assert_eq!(stored.used_count, 2);
        assert!(repo.find_by_code("spring").await.unwrap().is_some());
    }
}
