//! Process configuration, read once at startup from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

use medfind_infra::EngineConfig;
use medfind_infra::store::PostgresOptions;

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// Postgres when set; otherwise the in-memory store.
    pub database_url: Option<String>,
    pub seed_file: Option<PathBuf>,
    pub postgres: PostgresOptions,
    pub engine: EngineConfig,
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let bind_addr = lookup("MEDFIND_BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse()
            .context("MEDFIND_BIND_ADDR must be a socket address")?;

        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let mut postgres = PostgresOptions::default();
        if let Some(raw) = lookup("MEDFIND_DB_MAX_CONNECTIONS") {
            postgres.max_connections = raw
                .trim()
                .parse()
                .context("MEDFIND_DB_MAX_CONNECTIONS must be a positive integer")?;
        }
        if let Some(raw) = lookup("MEDFIND_DB_ACQUIRE_TIMEOUT_MS") {
            let millis: u64 = raw
                .trim()
                .parse()
                .context("MEDFIND_DB_ACQUIRE_TIMEOUT_MS must be milliseconds")?;
            postgres.acquire_timeout = Duration::from_millis(millis);
        }

        Ok(Self {
            bind_addr,
            jwt_secret,
            database_url: lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()),
            seed_file: lookup("MEDFIND_SEED_FILE").filter(|v| !v.trim().is_empty()).map(PathBuf::from),
            postgres,
            engine: EngineConfig::from_lookup(&lookup),
        })
    }
}
