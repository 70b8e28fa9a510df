use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use sql_web_migrate::access::AccessGate;
use sql_web_migrate::db::migrator::SqlxGateway;
use sql_web_migrate::{api, config, db};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sql_web_migrate=info".parse()?)
        )
        .init();

    info!("Starting sql-web-migrate v{}", env!("CARGO_PKG_VERSION"));

    let cfg = config::load()?;
    info!("Configuration loaded");

    let allowlist = Arc::new(cfg.allowlist()?);
    info!("Allowed networks: [{}]", allowlist);

    let pool = db::init(&cfg);
    let gateway = Arc::new(SqlxGateway::new(pool, &cfg.migration_source_path));

    api::serve(&cfg, AccessGate::new(allowlist), gateway).await
}
