//! In-memory port adapters for tests and embedded use.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};
use tally_core::cycle::BillingCycle;
use tally_core::ids::{LicenseId, RevisionId};
use tally_core::license::{LicenseRevision, LicenseStatus};
use tally_core::ports::{
    BillingCycleProvider, CycleUsage, PlanHistoryProvider, RevisionLookup, UsageRecordStore,
};
use tally_core::usage::{PlanHistoryRecord, UsageRecord};
use tally_core::{Error, Result};

/// Append-only usage store backed by a vector.
#[derive(Default)]
pub struct InMemoryUsageStore {
    records: Mutex<Vec<UsageRecord>>,
    list_calls: AtomicUsize,
}

impl InMemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<UsageRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of cycle queries served.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UsageRecordStore for InMemoryUsageStore {
    async fn insert(&self, record: &UsageRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    async fn list_for_cycle(
        &self,
        license_id: LicenseId,
        cycle: &BillingCycle,
    ) -> Result<CycleUsage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let mut grouped = CycleUsage::new();
        for record in records.iter().filter(|r| {
            r.license_id == license_id && r.start >= cycle.start && r.end <= cycle.end
        }) {
            grouped
                .entry(record.usage_group.clone())
                .or_default()
                .push(record.clone());
        }
        for group in grouped.values_mut() {
            group.sort_by_key(|r| r.start);
        }
        Ok(grouped)
    }
}

/// Revision lookup backed by a map.
#[derive(Default)]
pub struct InMemoryRevisionLookup {
    revisions: RwLock<HashMap<RevisionId, LicenseRevision>>,
}

impl InMemoryRevisionLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, revision: LicenseRevision) {
        self.revisions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(revision.id, revision);
    }

    /// Supersede or reactivate a stored revision.
    pub fn set_status(&self, id: RevisionId, status: LicenseStatus) -> Result<()> {
        let mut revisions = self
            .revisions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let revision = revisions
            .get_mut(&id)
            .ok_or_else(|| Error::RevisionNotFound(id.to_string()))?;
        revision.status = status;
        Ok(())
    }
}

#[async_trait]
impl RevisionLookup for InMemoryRevisionLookup {
    async fn load(&self, id: RevisionId) -> Result<LicenseRevision> {
        self.revisions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::RevisionNotFound(id.to_string()))
    }
}

/// Plan history backed by per-license segment lists.
#[derive(Default)]
pub struct InMemoryPlanHistory {
    segments: RwLock<HashMap<LicenseId, Vec<PlanHistoryRecord>>>,
}

impl InMemoryPlanHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, segment: PlanHistoryRecord) {
        self.segments
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(segment.revision.license_id)
            .or_default()
            .push(segment);
    }
}

#[async_trait]
impl PlanHistoryProvider for InMemoryPlanHistory {
    /// Segments overlapping the cycle, clipped to its bounds.
    async fn list_for_cycle(
        &self,
        license_id: LicenseId,
        cycle: &BillingCycle,
    ) -> Result<Vec<PlanHistoryRecord>> {
        let segments = self.segments.read().unwrap_or_else(PoisonError::into_inner);
        let mut overlapping: Vec<PlanHistoryRecord> = segments
            .get(&license_id)
            .map(|list| {
                list.iter()
                    .filter(|s| cycle.overlaps(s.start, s.end))
                    .map(|s| {
                        let mut clipped = s.clone();
                        clipped.start = s.start.max(cycle.start);
                        clipped.end = s.end.min(cycle.end);
                        clipped
                    })
                    .collect()
            })
            .unwrap_or_default();
        overlapping.sort_by_key(|s| s.start);
        Ok(overlapping)
    }
}

/// Serves one fixed cycle as the current cycle of its license.
pub struct FixedBillingCycle {
    cycle: BillingCycle,
}

impl FixedBillingCycle {
    pub fn new(cycle: BillingCycle) -> Self {
        Self { cycle }
    }
}

#[async_trait]
impl BillingCycleProvider for FixedBillingCycle {
    async fn current(&self, license_id: LicenseId) -> Result<BillingCycle> {
        if license_id == self.cycle.license_id {
            Ok(self.cycle)
        } else {
            Err(Error::BillingCycleNotFound(license_id.to_string()))
        }
    }
}
