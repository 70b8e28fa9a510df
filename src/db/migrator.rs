use async_trait::async_trait;
use serde::Serialize;
use sqlx::migrate::Migrator;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use super::models::{AppliedMigrationRow, MigrationRecord};
use super::DbPool;

/// Target passed to `Migrator::undo` to revert every applied migration.
const REVERT_ALL: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => f.write_str("up"),
            Direction::Down => f.write_str("down"),
        }
    }
}

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("failed to load migrations from {path}: {source}")]
    Source {
        path: String,
        #[source]
        source: sqlx::migrate::MigrateError,
    },

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Runs a batch of migrations in one direction and reports what is applied
/// afterwards.
#[async_trait]
pub trait MigrationGateway: Send + Sync {
    async fn migrate(&self, direction: Direction) -> Result<Vec<MigrationRecord>, MigrateError>;
}

/// Migrations read from a directory of sqlx migration files. `down` needs
/// reversible pairs (`<version>_<name>.up.sql` / `.down.sql`).
pub struct SqlxGateway {
    pool: DbPool,
    source_path: PathBuf,
}

impl SqlxGateway {
    pub fn new(pool: DbPool, source_path: impl Into<PathBuf>) -> Self {
        Self {
            pool,
            source_path: source_path.into(),
        }
    }

    // The directory is re-read on every call so new files need no restart.
    async fn load(&self) -> Result<Migrator, MigrateError> {
        Migrator::new(self.source_path.as_path())
            .await
            .map_err(|source| MigrateError::Source {
                path: self.source_path.display().to_string(),
                source,
            })
    }

    async fn applied(&self) -> Result<Vec<MigrationRecord>, sqlx::Error> {
        let table_exists: bool =
            sqlx::query_scalar("SELECT to_regclass('_sqlx_migrations') IS NOT NULL")
                .fetch_one(&self.pool)
                .await?;
        if !table_exists {
            return Ok(vec![]);
        }

        let rows: Vec<AppliedMigrationRow> = sqlx::query_as(
            "SELECT version, description, installed_on FROM _sqlx_migrations
             WHERE success ORDER BY version"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(MigrationRecord::from).collect())
    }
}

#[async_trait]
impl MigrationGateway for SqlxGateway {
    async fn migrate(&self, direction: Direction) -> Result<Vec<MigrationRecord>, MigrateError> {
        tracing::info!(
            source_path = %self.source_path.display(),
            %direction,
            "Setup source file path to migrate"
        );
        let migrator = self.load().await?;

        let before = self.applied().await?.len();
        match direction {
            Direction::Up => migrator.run(&self.pool).await?,
            Direction::Down => migrator.undo(&self.pool, REVERT_ALL).await?,
        }
        let records = self.applied().await?;

        tracing::info!(
            %direction,
            "Applied {} migrations!",
            records.len().abs_diff(before)
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
    use std::path::Path;
    use std::str::FromStr;

    fn write_reversible_migrations(dir: &Path) {
        let files = [
            ("1_init.up.sql", "CREATE TABLE t (x INT);"),
            ("1_init.down.sql", "DROP TABLE t;"),
            ("2_add_col.up.sql", "ALTER TABLE t ADD COLUMN y INT;"),
            ("2_add_col.down.sql", "ALTER TABLE t DROP COLUMN y;"),
        ];
        for (name, sql) in files {
            std::fs::write(dir.join(name), sql).unwrap();
        }
    }

    fn lazy_pool() -> DbPool {
        PgPoolOptions::new().connect_lazy_with(
            PgConnectOptions::new().host("127.0.0.1").port(1),
        )
    }

    #[test]
    fn test_direction_display_and_serde() {
        assert_eq!(Direction::Up.to_string(), "up");
        assert_eq!(Direction::Down.to_string(), "down");
        assert_eq!(serde_json::to_string(&Direction::Down).unwrap(), "\"down\"");
    }

    #[tokio::test]
    async fn test_missing_source_directory_fails_before_connecting() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let gateway = SqlxGateway::new(lazy_pool(), &missing);

        let err = gateway.migrate(Direction::Up).await.unwrap_err();
        match err {
            MigrateError::Source { path, .. } => assert_eq!(path, missing.display().to_string()),
            other => panic!("expected source error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_loads_reversible_migrations() {
        let dir = tempfile::tempdir().unwrap();
        write_reversible_migrations(dir.path());

        let gateway = SqlxGateway::new(lazy_pool(), dir.path());
        let migrator = gateway.load().await.unwrap();

        let versions: Vec<i64> = migrator
            .iter()
            .filter(|m| m.migration_type.is_up_migration())
            .map(|m| m.version)
            .collect();
        assert_eq!(versions, [1, 2]);
        assert_eq!(
            migrator.iter().filter(|m| m.migration_type.is_down_migration()).count(),
            2
        );
    }

    /// Runs against a real PostgreSQL: `DATABASE_URL=postgres://... cargo test -- --ignored`.
    /// Everything lives in a throwaway schema dropped at the end.
    #[tokio::test]
    #[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
    async fn test_up_then_down_against_postgres() {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping");
            return;
        };
        let schema = format!("sql_web_migrate_test_{}", std::process::id());

        let admin = PgPoolOptions::new().max_connections(1).connect(&url).await.unwrap();
        sqlx::query(&format!("DROP SCHEMA IF EXISTS {schema} CASCADE"))
            .execute(&admin)
            .await
            .unwrap();
        sqlx::query(&format!("CREATE SCHEMA {schema}"))
            .execute(&admin)
            .await
            .unwrap();

        let opts = PgConnectOptions::from_str(&url)
            .unwrap()
            .options([("search_path", schema.as_str())]);
        let pool = PgPoolOptions::new().max_connections(2).connect_with(opts).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        write_reversible_migrations(dir.path());
        let gateway = SqlxGateway::new(pool.clone(), dir.path());

        // No bookkeeping table yet
        assert!(gateway.applied().await.unwrap().is_empty());

        let records = gateway.migrate(Direction::Up).await.unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["1_init", "2_add_col"]);

        let columns: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM information_schema.columns
             WHERE table_schema = $1 AND table_name = 't'"
        )
        .bind(&schema)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(columns, 2);

        // Re-running up is a no-op
        assert_eq!(gateway.migrate(Direction::Up).await.unwrap(), records);

        let records = gateway.migrate(Direction::Down).await.unwrap();
        assert!(records.is_empty());

        pool.close().await;
        sqlx::query(&format!("DROP SCHEMA {schema} CASCADE"))
            .execute(&admin)
            .await
            .unwrap();
    }
}
