use axum::{extract::State, Json};
use std::sync::Arc;
use crate::api::{AppState, middleware::access::AllowedCaller};
use crate::db::migrator::Direction;
use crate::db::models::MigrationRecord;
use crate::error::AppResult;

pub async fn up(
    State(state): State<Arc<AppState>>,
    _caller: AllowedCaller,
) -> AppResult<Json<Vec<MigrationRecord>>> {
    run(&state, Direction::Up).await
}

pub async fn down(
    State(state): State<Arc<AppState>>,
    _caller: AllowedCaller,
) -> AppResult<Json<Vec<MigrationRecord>>> {
    run(&state, Direction::Down).await
}

async fn run(state: &AppState, direction: Direction) -> AppResult<Json<Vec<MigrationRecord>>> {
    let records = state.gateway.migrate(direction).await.map_err(|e| {
        tracing::error!("Migration {} failed: {}", direction, e);
        e
    })?;
    Ok(Json(records))
}
