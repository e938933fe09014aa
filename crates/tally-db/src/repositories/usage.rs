//! PostgreSQL implementation of UsageRecordStore.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tally_core::cycle::BillingCycle;
use tally_core::ids::{LicenseId, RevisionId, UsageGroupName, UsageRecordId};
use tally_core::ports::{CycleUsage, UsageRecordStore};
use tally_core::usage::UsageRecord;
use tally_core::{Error, Result};
use tracing::debug;

/// PostgreSQL implementation of UsageRecordStore.
pub struct PgUsageRecordStore {
    pool: PgPool,
}

impl PgUsageRecordStore {
    /// Create a new PgUsageRecordStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_record(r: &sqlx::postgres::PgRow) -> Result<UsageRecord> {
        let quantity = u64::try_from(r.get::<i64, _>("quantity"))
            .map_err(|e| Error::Database(format!("negative usage quantity: {}", e)))?;

        Ok(UsageRecord {
            id: UsageRecordId::from_uuid(r.get::<uuid::Uuid, _>("id")),
            license_id: LicenseId::from_uuid(r.get::<uuid::Uuid, _>("license_id")),
            revision_id: RevisionId::from_uuid(r.get::<uuid::Uuid, _>("revision_id")),
            usage_group: UsageGroupName::new(r.get::<String, _>("usage_group")),
            quantity,
            start: r.get("period_start"),
            end: r.get("period_end"),
            recorded_at: r.get("recorded_at"),
        })
    }
}

#[async_trait]
impl UsageRecordStore for PgUsageRecordStore {
    async fn insert(&self, record: &UsageRecord) -> Result<()> {
        let quantity = i64::try_from(record.quantity)
            .map_err(|e| Error::Database(format!("usage quantity out of range: {}", e)))?;

        sqlx::query(
            r#"INSERT INTO usage_records (id, license_id, revision_id, usage_group, quantity, period_start, period_end, recorded_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
        )
        .bind(record.id.as_uuid())
        .bind(record.license_id.as_uuid())
        .bind(record.revision_id.as_uuid())
        .bind(record.usage_group.as_str())
        .bind(quantity)
        .bind(record.start)
        .bind(record.end)
        .bind(record.recorded_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }

    async fn list_for_cycle(
        &self,
        license_id: LicenseId,
        cycle: &BillingCycle,
    ) -> Result<CycleUsage> {
        let rows = sqlx::query(
            r#"SELECT id, license_id, revision_id, usage_group, quantity, period_start, period_end, recorded_at
               FROM usage_records
               WHERE license_id = $1 AND period_start >= $2 AND period_end <= $3
               ORDER BY usage_group, period_start"#,
        )
        .bind(license_id.as_uuid())
        .bind(cycle.start)
        .bind(cycle.end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        let mut grouped = CycleUsage::new();
        for row in &rows {
            let record = Self::row_to_record(row)?;
            grouped
                .entry(record.usage_group.clone())
                .or_default()
                .push(record);
        }

        debug!(license_id = %license_id, cycle_id = %cycle.id, records = rows.len(), "Loaded cycle usage");
        Ok(grouped)
    }
}
