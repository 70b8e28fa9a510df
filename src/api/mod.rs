use anyhow::Result;
use axum::Router;
use tower_http::trace::TraceLayer;
use std::sync::Arc;
use std::net::SocketAddr;
use crate::access::AccessGate;
use crate::config::Config;
use crate::db::migrator::MigrationGateway;

pub mod router;
pub mod middleware;
pub mod handlers;

pub struct AppState {
    pub gate: AccessGate,
    pub gateway: Arc<dyn MigrationGateway>,
}

pub async fn serve(
    cfg: &Config,
    gate: AccessGate,
    gateway: Arc<dyn MigrationGateway>,
) -> Result<()> {
    let bind_addr = cfg.listen_addr()?;
    tracing::info!("{} allowed network(s) configured", gate.allowlist().len());
    let state = Arc::new(AppState { gate, gateway });
    let app = build_app(state);

    // ConnectInfo carries the TCP peer address to the access gate
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Migration API listening on http://{}", bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(router::routes(state))
        .layer(TraceLayer::new_for_http())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
