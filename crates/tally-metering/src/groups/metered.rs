//! Metered consumption (API calls, build minutes, storage units).

use crate::group::{UsageGroup, UsageGroupBase};
use async_trait::async_trait;
use std::collections::HashMap;
use tally_core::Result;
use tally_core::cycle::BillingCycle;
use tally_core::ids::RevisionId;
use tally_core::usage::UsageRecord;

/// Usage accumulates; each revision's free allowance is consumed by that
/// revision's records in chronological order.
pub struct MeteredUsageGroup {
    base: UsageGroupBase,
}

impl MeteredUsageGroup {
    pub const KIND: &'static str = "metered";

    pub fn new(base: UsageGroupBase) -> Self {
        Self { base }
    }

    pub fn boxed(base: UsageGroupBase) -> Box<dyn UsageGroup> {
        Box::new(Self::new(base))
    }
}

#[async_trait]
impl UsageGroup for MeteredUsageGroup {
    fn base(&self) -> &UsageGroupBase {
        &self.base
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    async fn chargeable_usage(&self, cycle: &BillingCycle) -> Result<Vec<UsageRecord>> {
        let history = self.usage_history(cycle).await?;
        let free = self.free_quantities(cycle).await?;

        let mut remaining: HashMap<RevisionId, u64> = free
            .iter()
            .map(|(revision_id, window)| (*revision_id, window.quantity))
            .collect();

        let mut chargeable = Vec::with_capacity(history.len());
        for mut record in history {
            let allowance = remaining.entry(record.revision_id).or_insert(0);
            if *allowance >= record.quantity {
                *allowance -= record.quantity;
                continue;
            }
            record.quantity -= *allowance;
            *allowance = 0;
            chargeable.push(record);
        }

        Ok(chargeable)
    }
}
