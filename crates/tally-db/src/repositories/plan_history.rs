//! PostgreSQL implementation of PlanHistoryProvider.

use super::revision::{REVISION_COLUMNS, row_to_revision};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tally_core::cycle::BillingCycle;
use tally_core::ids::{LicenseId, RevisionId};
use tally_core::ports::PlanHistoryProvider;
use tally_core::usage::PlanHistoryRecord;
use tally_core::{Error, Result};

/// PostgreSQL implementation of PlanHistoryProvider.
pub struct PgPlanHistoryProvider {
    pool: PgPool,
}

impl PgPlanHistoryProvider {
    /// Create a new PgPlanHistoryProvider.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record the segment during which a revision's plan was billed.
    pub async fn record_segment(
        &self,
        license_id: LicenseId,
        revision_id: RevisionId,
        start: i64,
        end: i64,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO plan_history (license_id, revision_id, period_start, period_end) VALUES ($1, $2, $3, $4)",
        )
        .bind(license_id.as_uuid())
        .bind(revision_id.as_uuid())
        .bind(start)
        .bind(end)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl PlanHistoryProvider for PgPlanHistoryProvider {
    async fn list_for_cycle(
        &self,
        license_id: LicenseId,
        cycle: &BillingCycle,
    ) -> Result<Vec<PlanHistoryRecord>> {
        // Segments are clipped to the cycle so durations sum to at most its length.
        let rows = sqlx::query(&format!(
            r#"SELECT {}, GREATEST(p.period_start, $2) AS seg_start, LEAST(p.period_end, $3) AS seg_end
               FROM plan_history p
               JOIN license_revisions r ON r.id = p.revision_id
               WHERE p.license_id = $1 AND p.period_start <= $3 AND p.period_end >= $2
               ORDER BY p.period_start"#,
            REVISION_COLUMNS
        ))
        .bind(license_id.as_uuid())
        .bind(cycle.start)
        .bind(cycle.end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        rows.iter()
            .map(|r| {
                Ok(PlanHistoryRecord::new(
                    row_to_revision(r)?,
                    r.get::<i64, _>("seg_start"),
                    r.get::<i64, _>("seg_end"),
                ))
            })
            .collect()
    }
}
