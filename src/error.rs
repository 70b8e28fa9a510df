use thiserror::Error;

use crate::db::migrator::MigrateError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Access forbidden")]
    Forbidden,

    #[error("Migration error: {0}")]
    Migration(#[from] MigrateError),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;
        use axum::Json;
        use serde_json::json;

        match self {
            // Denied callers learn nothing about the allowlist.
            AppError::Forbidden => StatusCode::FORBIDDEN.into_response(),
            AppError::Migration(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
