//! Request-scoped cache of usage history.
//!
//! One storage query per (license, cycle) pair serves every usage group of
//! that license. Any write for the license drops its entries.

use std::collections::HashMap;
use std::sync::Arc;
use tally_core::Result;
use tally_core::cycle::BillingCycle;
use tally_core::ids::{BillingCycleId, LicenseId};
use tally_core::ports::{CycleUsage, UsageRecordStore};
use tally_core::usage::UsageRecord;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    license_id: LicenseId,
    cycle_id: BillingCycleId,
    start: i64,
    end: i64,
}

impl CacheKey {
    fn new(license_id: LicenseId, cycle: &BillingCycle) -> Self {
        Self {
            license_id,
            cycle_id: cycle.id,
            start: cycle.start,
            end: cycle.end,
        }
    }
}

/// Usage history keyed by license and billing cycle.
///
/// Inserts go through [`UsageHistoryCache::record`], which holds the write
/// lock across the store insert and the invalidation so no reader can cache
/// a snapshot taken before a committed insert.
#[derive(Default)]
pub struct UsageHistoryCache {
    entries: RwLock<HashMap<CacheKey, Arc<CycleUsage>>>,
}

impl UsageHistoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached history for the cycle, loading it from the store on
    /// first use.
    pub async fn get_or_load(
        &self,
        license_id: LicenseId,
        cycle: &BillingCycle,
        store: &dyn UsageRecordStore,
    ) -> Result<Arc<CycleUsage>> {
        let key = CacheKey::new(license_id, cycle);

        {
            let entries = self.entries.read().await;
            if let Some(history) = entries.get(&key) {
                debug!(license_id = %license_id, cycle_id = %cycle.id, "Usage history cache hit");
                return Ok(history.clone());
            }
        }

        let mut entries = self.entries.write().await;
        if let Some(history) = entries.get(&key) {
            return Ok(history.clone());
        }

        debug!(license_id = %license_id, cycle_id = %cycle.id, "Usage history cache miss");
        let history = Arc::new(store.list_for_cycle(license_id, cycle).await?);
        entries.insert(key, history.clone());
        Ok(history)
    }

    /// Insert a record and drop every cached cycle of its license.
    ///
    /// Entries are dropped even when the insert fails.
    pub async fn record(&self, record: &UsageRecord, store: &dyn UsageRecordStore) -> Result<()> {
        let mut entries = self.entries.write().await;
        let inserted = store.insert(record).await;
        entries.retain(|key, _| key.license_id != record.license_id);
        inserted
    }

    /// Drop every cached cycle of a license.
    pub async fn invalidate(&self, license_id: LicenseId) {
        let mut entries = self.entries.write().await;
        entries.retain(|key, _| key.license_id != license_id);
        debug!(license_id = %license_id, "Usage history cache invalidated");
    }

    pub async fn contains(&self, license_id: LicenseId, cycle: &BillingCycle) -> bool {
        self.entries
            .read()
            .await
            .contains_key(&CacheKey::new(license_id, cycle))
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryUsageStore;
    use tally_core::ids::{RevisionId, UsageGroupName};

    fn record(license_id: LicenseId, start: i64, end: i64) -> UsageRecord {
        UsageRecord::new(
            license_id,
            RevisionId::new(),
            UsageGroupName::from("api_calls"),
            1,
            start,
            end,
        )
    }

    #[tokio::test]
    async fn test_loads_once_per_cycle() {
        let store = InMemoryUsageStore::new();
        let cache = UsageHistoryCache::new();
        let license_id = LicenseId::new();
        let cycle = BillingCycle::new(license_id, 1000, 1999);

        cache.get_or_load(license_id, &cycle, &store).await.unwrap();
        cache.get_or_load(license_id, &cycle, &store).await.unwrap();

        assert_eq!(store.list_calls(), 1);
        assert!(cache.contains(license_id, &cycle).await);
    }

    #[tokio::test]
    async fn test_record_invalidates_only_that_license() {
        let store = InMemoryUsageStore::new();
        let cache = UsageHistoryCache::new();
        let first = LicenseId::new();
        let second = LicenseId::new();
        let first_cycle = BillingCycle::new(first, 1000, 1999);
        let second_cycle = BillingCycle::new(second, 1000, 1999);

        cache.get_or_load(first, &first_cycle, &store).await.unwrap();
        cache.get_or_load(second, &second_cycle, &store).await.unwrap();
        assert_eq!(cache.len().await, 2);

        cache.record(&record(first, 1000, 1100), &store).await.unwrap();

        assert!(!cache.contains(first, &first_cycle).await);
        assert!(cache.contains(second, &second_cycle).await);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_clears_license() {
        let store = InMemoryUsageStore::new();
        let cache = UsageHistoryCache::new();
        let license_id = LicenseId::new();
        let cycle = BillingCycle::new(license_id, 1000, 1999);

        cache.get_or_load(license_id, &cycle, &store).await.unwrap();
        cache.invalidate(license_id).await;

        assert!(cache.is_empty().await);
    }
}
