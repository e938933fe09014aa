//! Test context wiring the Postgres adapters into a metering context.

use crate::containers::PostgresContainer;
use std::sync::Arc;
use tally_db::{
    Database, DatabaseConfig, PgBillingCycleProvider, PgPlanHistoryProvider, PgRevisionLookup,
    PgUsageRecordStore,
};
use tally_metering::MeteringContext;

/// Running PostgreSQL with migrations applied.
///
/// Drop this to stop the container.
pub struct TestContext {
    pub postgres: PostgresContainer,
    pub db: Database,
}

impl TestContext {
    /// Create context with only PostgreSQL.
    pub async fn postgres_only() -> anyhow::Result<Self> {
        crate::init_test_logging();

        let postgres = PostgresContainer::start().await?;
        let config = DatabaseConfig::new(postgres.connection_string()).with_max_connections(5);
        let db = Database::connect_with(&config).await?;
        db.migrate().await?;

        Ok(Self { postgres, db })
    }

    pub fn revisions(&self) -> PgRevisionLookup {
        PgRevisionLookup::new(self.db.pool().clone())
    }

    pub fn usage(&self) -> PgUsageRecordStore {
        PgUsageRecordStore::new(self.db.pool().clone())
    }

    pub fn plan_history(&self) -> PgPlanHistoryProvider {
        PgPlanHistoryProvider::new(self.db.pool().clone())
    }

    pub fn cycles(&self) -> PgBillingCycleProvider {
        PgBillingCycleProvider::new(self.db.pool().clone())
    }

    /// A fresh request-scoped metering context over the database.
    pub fn metering(&self) -> MeteringContext {
        MeteringContext::new(
            Arc::new(self.revisions()),
            Arc::new(self.usage()),
            Arc::new(self.plan_history()),
            Arc::new(self.cycles()),
        )
    }

    /// Get database connection string.
    pub fn db_url(&self) -> &str {
        self.postgres.connection_string()
    }
}
