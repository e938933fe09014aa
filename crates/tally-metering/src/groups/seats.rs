//! Seat counting (editors, agents, named users).

use crate::group::{UsageGroup, UsageGroupBase};
use async_trait::async_trait;
use tally_core::Result;
use tally_core::cycle::BillingCycle;
use tally_core::license::{PROPERTY_PRODUCT, PROPERTY_STATUS, RevisionTransition};
use tally_core::usage::UsageRecord;
use tracing::info;

/// Each record reports the seats held over its interval. Usage is the peak
/// seat count, and free seats apply to every interval independently.
///
/// Seat intervals are attributed to the plan in force, so status and plan
/// changes are deferred to the cycle boundary.
pub struct SeatUsageGroup {
    base: UsageGroupBase,
}

impl SeatUsageGroup {
    pub const KIND: &'static str = "seats";

    pub fn new(base: UsageGroupBase) -> Self {
        Self { base }
    }

    pub fn boxed(base: UsageGroupBase) -> Box<dyn UsageGroup> {
        Box::new(Self::new(base))
    }
}

#[async_trait]
impl UsageGroup for SeatUsageGroup {
    fn base(&self) -> &UsageGroupBase {
        &self.base
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn enforce_change_scheduling(&self, property: &str) -> bool {
        property == PROPERTY_PRODUCT || property == PROPERTY_STATUS || self.base.schedules(property)
    }

    async fn current_usage(&self, cycle: Option<&BillingCycle>) -> Result<u64> {
        let cycle = self.base.resolve_cycle(cycle).await?;
        let history = self.usage_history(&cycle).await?;
        Ok(history.iter().map(|r| r.quantity).max().unwrap_or(0))
    }

    async fn chargeable_usage(&self, cycle: &BillingCycle) -> Result<Vec<UsageRecord>> {
        let history = self.usage_history(cycle).await?;
        let free = self.free_quantities(cycle).await?;

        Ok(history
            .into_iter()
            .filter_map(|mut record| {
                let free_seats = free.get(&record.revision_id).map_or(0, |w| w.quantity);
                record.quantity = record.quantity.saturating_sub(free_seats);
                (record.quantity > 0).then_some(record)
            })
            .collect())
    }

    async fn on_revision_change(&self, transition: &RevisionTransition) -> Result<()> {
        let license_id = transition.license_id();
        self.base.context().cache().invalidate(license_id).await;

        info!(
            license_id = %license_id,
            group = %self.base.name(),
            previous = ?transition.previous.as_ref().map(|r| r.id),
            current = %transition.current.id,
            "Seat attribution moved to new revision"
        );
        Ok(())
    }
}
