use anyhow::Result;
use serde::Deserialize;
use std::net::SocketAddr;

use crate::access::Allowlist;

pub const ENV_PREFIX: &str = "SQL_MIGRATE";

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_SSL_MODE: &str = "disable";
pub const DEFAULT_MIGRATION_SOURCE_PATH: &str = "/etc/migrate";
pub const DEFAULT_LISTEN: &str = "0.0.0.0:8080";

pub const SSL_MODE_FORMAT_ERROR: &str =
    "SSLMode should be require, verify-full, verify-ca, or disable";

/// Settings read once at startup from `SQL_MIGRATE_*` environment variables
/// (and an optional `config` file).
#[derive(Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub ssl_mode: String,
    pub migration_source_path: String,
    /// Comma-separated CIDR ranges allowed to call the migrate endpoints.
    pub allowed_networks: String,
    pub listen: String,
}

impl Config {
    pub fn allowlist(&self) -> Result<Allowlist> {
        Ok(Allowlist::build(&self.allowed_networks)?)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            anyhow::anyhow!("CONFIG ERROR: invalid listen address '{}': {}", self.listen, e)
        })
    }
}

// Password stays out of Debug output.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("dbname", &self.dbname)
            .field("ssl_mode", &self.ssl_mode)
            .field("migration_source_path", &self.migration_source_path)
            .field("allowed_networks", &self.allowed_networks)
            .field("listen", &self.listen)
            .finish_non_exhaustive()
    }
}

pub fn validate(cfg: &Config) -> Result<()> {
    if crate::db::ssl_mode(&cfg.ssl_mode).is_none() {
        anyhow::bail!("CONFIG ERROR: {} (got '{}')", SSL_MODE_FORMAT_ERROR, cfg.ssl_mode);
    }

    cfg.listen_addr()?;

    let allowlist = cfg
        .allowlist()
        .map_err(|e| anyhow::anyhow!("CONFIG ERROR: {}_ALLOWED_NETWORKS: {}", ENV_PREFIX, e))?;
    if allowlist.is_empty() {
        tracing::warn!(
            "{}_ALLOWED_NETWORKS is empty; every migration request will be rejected",
            ENV_PREFIX
        );
    }

    tracing::info!("Configuration validation passed");
    Ok(())
}

pub fn load() -> Result<Config> {
    load_with(config::Environment::with_prefix(ENV_PREFIX))
}

/// Load from an explicit environment source. Empty values count as unset.
pub fn load_with(env: config::Environment) -> Result<Config> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name("config").required(false))
        .add_source(env.ignore_empty(true))
        .set_default("host", DEFAULT_HOST)?
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("user", "")?
        .set_default("password", "")?
        .set_default("dbname", "")?
        .set_default("ssl_mode", DEFAULT_SSL_MODE)?
        .set_default("migration_source_path", DEFAULT_MIGRATION_SOURCE_PATH)?
        .set_default("allowed_networks", "")?
        .set_default("listen", DEFAULT_LISTEN)?
        .build()?
        .try_deserialize()?;

    validate(&cfg)?;

    Ok(cfg)
}
