//! # Stockflow API Server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  load ApiConfig ──► open SQLite (migrations) ──► EuPago client          │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  axum::serve(router) ──── Ctrl+C / SIGTERM ──► graceful shutdown        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stockflow_api::{router, ApiConfig, AppState};
use stockflow_db::Database;
use stockflow_gateway::EupagoClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,stockflow=debug")),
        )
        .with_target(true)
        .init();

    info!("Starting Stockflow API...");

    // Load configuration
    let config = ApiConfig::load()?;
    let addr = config.socket_addr()?;
    info!(
        %addr,
        database = %config.database_path.display(),
        gateway = %config.eupago_base_url,
        "Configuration loaded"
    );

    // Open database (runs migrations)
    let db = Database::new(config.db_config()).await?;
    info!("Database ready");

    let gateway = EupagoClient::new(config.gateway_config()?)?;

    let state = AppState::new(db.clone(), gateway, config);
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
