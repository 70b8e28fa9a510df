use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Row of sqlx's `_sqlx_migrations` bookkeeping table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AppliedMigrationRow {
    pub version: i64,
    pub description: String,
    pub installed_on: DateTime<Utc>,
}

/// One applied migration as reported to HTTP callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationRecord {
    pub id: String,
    pub applied_at: DateTime<Utc>,
}

impl From<AppliedMigrationRow> for MigrationRecord {
    fn from(row: AppliedMigrationRow) -> Self {
        Self {
            id: format!("{}_{}", row.version, row.description.replace(' ', "_")),
            applied_at: row.installed_on,
        }
    }
}
