//! Port traits (hexagonal architecture).
//!
//! These traits define the interfaces between the metering engine and the
//! storage adapters that own licenses, cycles, and usage.

use crate::cycle::BillingCycle;
use crate::ids::{LicenseId, RevisionId, UsageGroupName};
use crate::license::LicenseRevision;
use crate::usage::{PlanHistoryRecord, UsageRecord};
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Usage records of one cycle, grouped by usage group name.
pub type CycleUsage = HashMap<UsageGroupName, Vec<UsageRecord>>;

/// Lookup of license revisions.
#[async_trait]
pub trait RevisionLookup: Send + Sync {
    /// Load a revision. Fails with `Error::RevisionNotFound` for unknown ids.
    async fn load(&self, id: RevisionId) -> Result<LicenseRevision>;
}

/// Append-only store of usage records.
#[async_trait]
pub trait UsageRecordStore: Send + Sync {
    /// Persist a record. Must be atomic: either the record is stored or an
    /// error is returned.
    async fn insert(&self, record: &UsageRecord) -> Result<()>;

    /// All records of a license that fall within the cycle, by group.
    async fn list_for_cycle(&self, license_id: LicenseId, cycle: &BillingCycle)
    -> Result<CycleUsage>;
}

/// Source of the revision segments billed within a cycle.
#[async_trait]
pub trait PlanHistoryProvider: Send + Sync {
    /// Contiguous, non-overlapping segments ordered by start.
    async fn list_for_cycle(
        &self,
        license_id: LicenseId,
        cycle: &BillingCycle,
    ) -> Result<Vec<PlanHistoryRecord>>;
}

/// Source of the billing cycle currently open for a license.
#[async_trait]
pub trait BillingCycleProvider: Send + Sync {
    async fn current(&self, license_id: LicenseId) -> Result<BillingCycle>;
}
