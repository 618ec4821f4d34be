use std::str::FromStr;

use anyhow::Context;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use tracing::info;

use crate::config::DbConfig;

/// PostgreSQL-backed credential store and history ledger.
#[derive(Clone)]
pub struct PgStore {
    pub(crate) pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DbConfig) -> anyhow::Result<Self> {
        let options = connect_options(config)?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    /// Creates the tables if they are missing. Safe to run on every startup.
    pub async fn create_all_tables(&self) -> anyhow::Result<()> {
        info!("applying database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn connect_options(config: &DbConfig) -> anyhow::Result<PgConnectOptions> {
    let dsn = config.dsn.trim();
    let base = if dsn.starts_with("postgres://") || dsn.starts_with("postgresql://") {
        PgConnectOptions::from_str(dsn).context("parse DB_DSN url")?
    } else {
        let (host_port, database) = dsn.split_once('/').unwrap_or((dsn, ""));
        let (host, port) = match host_port.rsplit_once(':') {
            Some((host, port)) => (
                host,
                Some(
                    port.parse::<u16>()
                        .with_context(|| format!("invalid port in DB_DSN: {port:?}"))?,
                ),
            ),
            None => (host_port, None),
        };
        let mut options = PgConnectOptions::new().host(host);
        if let Some(port) = port {
            options = options.port(port);
        }
        if !database.is_empty() {
            options = options.database(database);
        }
        options
    };
    Ok(base.username(&config.user).password(&config.password))
}

/// What a failed insert tells us about the constraints involved.
pub(crate) enum Violation<'a> {
    Unique { constraint: Option<&'a str> },
    ForeignKey,
    Other,
}

pub(crate) fn classify(err: &sqlx::Error) -> Violation<'_> {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => Violation::Unique {
            constraint: db_err.constraint(),
        },
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            Violation::ForeignKey
        }
        _ => Violation::Other,
    }
}
