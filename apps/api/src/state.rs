//! # Application State
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  AppState (Clone, shared by every handler)                              │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────────────┐  │
//! │  │  Database    │  │  EupagoClient    │  │  Arc<ApiConfig>          │  │
//! │  │  SQLite pool │  │  reqwest pool    │  │  read-only after start   │  │
//! │  └──────────────┘  └──────────────────┘  └──────────────────────────┘  │
//! │                                                                         │
//! │  All three are cheap to clone; no locks are needed.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use stockflow_db::Database;
use stockflow_gateway::EupagoClient;

use crate::config::ApiConfig;

#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub gateway: EupagoClient,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, gateway: EupagoClient, config: ApiConfig) -> Self {
        AppState {
            db,
            gateway,
            config: Arc::new(config),
        }
    }

    pub fn webhook_secret(&self) -> &[u8] {
        self.config.webhook_secret.as_bytes()
    }
}
