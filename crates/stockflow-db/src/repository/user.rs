//! # User Repository

use crate::collections::USERS;
use crate::error::DbResult;
use crate::store::DocumentStore;
use stockflow_core::User;

/// Repository for account holders.
#[derive(Debug, Clone)]
pub struct UserRepository {
    store: DocumentStore,
}

impl UserRepository {
    pub fn new(store: DocumentStore) -> Self {
        UserRepository { store }
    }

    pub async fn get(&self, user_id: &str) -> DbResult<Option<User>> {
        self.store.get(USERS, user_id).await
    }

    pub async fn get_required(&self, user_id: &str) -> DbResult<User> {
        self.store.get_required(USERS, user_id, "User").await
    }

    pub async fn insert(&self, user: &User) -> DbResult<()> {
        self.store.set(USERS, &user.id, user).await
    }
}
