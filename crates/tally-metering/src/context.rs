//! Request-scoped collaborators shared by the usage groups of one operation.

use crate::cache::UsageHistoryCache;
use std::sync::Arc;
use tally_core::ports::{
    BillingCycleProvider, PlanHistoryProvider, RevisionLookup, UsageRecordStore,
};

/// Ports plus the usage-history cache for one top-level operation.
///
/// Cloning shares the cache; build a new context per request so cached
/// history never outlives the operation that loaded it.
#[derive(Clone)]
pub struct MeteringContext {
    revisions: Arc<dyn RevisionLookup>,
    usage: Arc<dyn UsageRecordStore>,
    plan_history: Arc<dyn PlanHistoryProvider>,
    cycles: Arc<dyn BillingCycleProvider>,
    cache: Arc<UsageHistoryCache>,
}

impl MeteringContext {
    pub fn new(
        revisions: Arc<dyn RevisionLookup>,
        usage: Arc<dyn UsageRecordStore>,
        plan_history: Arc<dyn PlanHistoryProvider>,
        cycles: Arc<dyn BillingCycleProvider>,
    ) -> Self {
        Self {
            revisions,
            usage,
            plan_history,
            cycles,
            cache: Arc::new(UsageHistoryCache::new()),
        }
    }

    /// Replace the cache, e.g. to share one across contexts of a request.
    pub fn with_cache(mut self, cache: Arc<UsageHistoryCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn revisions(&self) -> &dyn RevisionLookup {
        self.revisions.as_ref()
    }

    pub fn usage(&self) -> &dyn UsageRecordStore {
        self.usage.as_ref()
    }

    pub fn plan_history(&self) -> &dyn PlanHistoryProvider {
        self.plan_history.as_ref()
    }

    pub fn cycles(&self) -> &dyn BillingCycleProvider {
        self.cycles.as_ref()
    }

    pub fn cache(&self) -> &Arc<UsageHistoryCache> {
        &self.cache
    }
}
