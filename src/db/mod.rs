use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use std::time::Duration;
use crate::config::Config;

pub mod migrator;
pub mod models;

pub type DbPool = PgPool;

/// Database connection parameters taken from the service configuration.
#[derive(Clone)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub ssl_mode: String,
}

impl ConnectionSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            host: cfg.host.clone(),
            port: cfg.port,
            user: cfg.user.clone(),
            password: cfg.password.clone(),
            dbname: cfg.dbname.clone(),
            ssl_mode: cfg.ssl_mode.clone(),
        }
    }

    /// A host starting with `/` names a Unix-domain socket directory.
    pub fn uses_socket(&self) -> bool {
        self.host.starts_with('/')
    }

    /// libpq keyword/value form, password masked. Only used for logging.
    pub fn connection_string(&self) -> String {
        let password = if self.password.is_empty() { "" } else { "***" };
        if self.uses_socket() {
            format!(
                "host={} user={} password={} dbname={}",
                self.host, self.user, password, self.dbname
            )
        } else {
            format!(
                "host={} port={} user={} password={} dbname={} sslmode={}",
                self.host, self.port, self.user, password, self.dbname, self.ssl_mode
            )
        }
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        let mut opts = PgConnectOptions::new();

        opts = if self.uses_socket() {
            opts.socket(&self.host)
        } else {
            opts.host(&self.host)
                .port(self.port)
                .ssl_mode(ssl_mode(&self.ssl_mode).unwrap_or(PgSslMode::Disable))
        };

        // Empty values leave libpq-style defaults (PGUSER etc.) in place.
        if !self.user.is_empty() {
            opts = opts.username(&self.user);
        }
        if !self.password.is_empty() {
            opts = opts.password(&self.password);
        }
        if !self.dbname.is_empty() {
            opts = opts.database(&self.dbname);
        }
        opts
    }
}

pub fn ssl_mode(mode: &str) -> Option<PgSslMode> {
    match mode {
        "require" => Some(PgSslMode::Require),
        "verify-full" => Some(PgSslMode::VerifyFull),
        "verify-ca" => Some(PgSslMode::VerifyCa),
        "disable" => Some(PgSslMode::Disable),
        _ => None,
    }
}

/// Lazily connecting pool: startup never touches the database, each
/// migration request connects on demand.
pub fn init(cfg: &Config) -> DbPool {
    let settings = ConnectionSettings::from_config(cfg);
    tracing::info!("Database target: {}", settings.connection_string());

    PgPoolOptions::new()
        .max_connections(4)
        .acquire_timeout(Duration::from_secs(10))
        .connect_lazy_with(settings.connect_options())
}
