use axum::{routing::get, Router};
use std::sync::Arc;
use super::AppState;
use super::handlers;

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        // Health (public)
        .route("/health", get(handlers::health::health_check))
        // Migrations (allowlisted callers only)
        .route("/migrate/up", get(handlers::migrate::up).post(handlers::migrate::up))
        .route("/migrate/down", get(handlers::migrate::down).post(handlers::migrate::down))
        .with_state(state)
}
