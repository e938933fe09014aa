//! PostgreSQL storage adapters for Tally.
//!
//! Every metering port has a `Pg*` implementation over one shared pool.
//! Schema changes live in `migrations/` and are applied by
//! [`Database::migrate`].

pub mod repositories;

pub use repositories::*;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tally_core::{Error, Result};
use tracing::info;

/// Pool settings for the usage database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 20;
    pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Self::DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn with_acquire_timeout(mut self, acquire_timeout: Duration) -> Self {
        self.acquire_timeout = acquire_timeout;
        self
    }
}

/// Connection pool shared by the `Pg*` adapters.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect with default pool settings.
    pub async fn connect(database_url: &str) -> Result<Self> {
        Self::connect_with(&DatabaseConfig::new(database_url)).await
    }

    pub async fn connect_with(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Connected to usage database"
        );
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        let migrator = sqlx::migrate!("./migrations");
        migrator
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        info!(
            migrations = migrator.iter().count(),
            "Usage schema up to date"
        );
        Ok(())
    }
}
