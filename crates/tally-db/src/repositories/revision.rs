//! PostgreSQL implementation of RevisionLookup.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tally_core::ids::{LicenseId, PlanId, RevisionId};
use tally_core::license::{LicenseRevision, LicenseStatus};
use tally_core::ports::RevisionLookup;
use tally_core::{Error, Result};

pub(crate) const REVISION_COLUMNS: &str =
    "r.id, r.license_id, r.status, r.product_id, r.usage_groups, r.plan_attributes, r.created_at";

pub(crate) fn row_to_revision(r: &PgRow) -> Result<LicenseRevision> {
    let status_str: String = r.get("status");
    let status = LicenseStatus::from_string(&status_str)
        .ok_or_else(|| Error::Database(format!("unknown revision status: {}", status_str)))?;

    Ok(LicenseRevision {
        id: RevisionId::from_uuid(r.get::<uuid::Uuid, _>("id")),
        license_id: LicenseId::from_uuid(r.get::<uuid::Uuid, _>("license_id")),
        status,
        product_id: PlanId::from_uuid(r.get::<uuid::Uuid, _>("product_id")),
        usage_groups: serde_json::from_value(r.get("usage_groups"))?,
        plan_attributes: serde_json::from_value(r.get("plan_attributes"))?,
        created_at: r.get("created_at"),
    })
}

/// PostgreSQL implementation of RevisionLookup.
pub struct PgRevisionLookup {
    pool: PgPool,
}

impl PgRevisionLookup {
    /// Create a new PgRevisionLookup.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a revision snapshot. Revisions are immutable apart from the
    /// status flip that supersedes them.
    pub async fn insert(&self, revision: &LicenseRevision) -> Result<()> {
        let usage_groups = serde_json::to_value(&revision.usage_groups)?;
        let plan_attributes = serde_json::to_value(&revision.plan_attributes)?;

        sqlx::query(
            r#"INSERT INTO license_revisions (id, license_id, status, product_id, usage_groups, plan_attributes, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(revision.id.as_uuid())
        .bind(revision.license_id.as_uuid())
        .bind(revision.status.as_str())
        .bind(revision.product_id.as_uuid())
        .bind(&usage_groups)
        .bind(&plan_attributes)
        .bind(revision.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }

    /// Change the status of a stored revision.
    pub async fn set_status(&self, id: RevisionId, status: LicenseStatus) -> Result<()> {
        let result = sqlx::query("UPDATE license_revisions SET status = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(Error::RevisionNotFound(id.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RevisionLookup for PgRevisionLookup {
    async fn load(&self, id: RevisionId) -> Result<LicenseRevision> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM license_revisions r WHERE r.id = $1",
            REVISION_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        match row {
            Some(r) => row_to_revision(&r),
            None => Err(Error::RevisionNotFound(id.to_string())),
        }
    }
}
