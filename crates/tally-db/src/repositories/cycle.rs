//! PostgreSQL implementation of BillingCycleProvider.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tally_core::cycle::BillingCycle;
use tally_core::ids::{BillingCycleId, LicenseId};
use tally_core::ports::BillingCycleProvider;
use tally_core::{Error, Result};

/// PostgreSQL implementation of BillingCycleProvider.
pub struct PgBillingCycleProvider {
    pool: PgPool,
}

impl PgBillingCycleProvider {
    /// Create a new PgBillingCycleProvider.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store an open cycle.
    pub async fn open(&self, cycle: &BillingCycle) -> Result<()> {
        sqlx::query(
            "INSERT INTO billing_cycles (id, license_id, period_start, period_end) VALUES ($1, $2, $3, $4)",
        )
        .bind(cycle.id.as_uuid())
        .bind(cycle.license_id.as_uuid())
        .bind(cycle.start)
        .bind(cycle.end)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }

    /// Mark a cycle closed; it stops being the current cycle.
    pub async fn close(&self, id: BillingCycleId) -> Result<()> {
        let result = sqlx::query("UPDATE billing_cycles SET closed_at = NOW() WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(Error::BillingCycleNotFound(id.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BillingCycleProvider for PgBillingCycleProvider {
    async fn current(&self, license_id: LicenseId) -> Result<BillingCycle> {
        let row = sqlx::query(
            "SELECT id, license_id, period_start, period_end FROM billing_cycles WHERE license_id = $1 AND closed_at IS NULL ORDER BY period_start DESC LIMIT 1",
        )
        .bind(license_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(BillingCycle {
                id: BillingCycleId::from_uuid(r.get::<uuid::Uuid, _>("id")),
                license_id: LicenseId::from_uuid(r.get::<uuid::Uuid, _>("license_id")),
                start: r.get("period_start"),
                end: r.get("period_end"),
            }),
            None => Err(Error::BillingCycleNotFound(license_id.to_string())),
        }
    }
}
