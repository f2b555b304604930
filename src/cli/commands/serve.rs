use std::sync::Arc;

use anyhow::Context;
use axum::{extract::Request, ServiceExt};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::app::{self, AppState};
use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::store::{MemoryStore, PgStore, Store};

pub async fn handle(config: &AppConfig, memory: bool) -> anyhow::Result<()> {
    config.check().map_err(anyhow::Error::msg)?;

    let store: Arc<dyn Store> = if memory {
        warn!("Using the in-process store; all data is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        let pool = DatabaseManager::connect(&config.database).await?;
        DatabaseManager::migrate(&pool).await?;
        Arc::new(PgStore::new(pool))
    };

    let tokens = TokenService::new(&config.security)?;
    let service = app::service(AppState::new(store, tokens), config);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("SkillSync API listening on http://{}", bind_addr);

    axum::serve(listener, ServiceExt::<Request>::into_make_service(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
