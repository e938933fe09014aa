//! The usage-group contract and the logic shared by every variant.
//!
//! A usage group is bound to one license and one named usage dimension. It
//! records usage against the license's active revision, reads the cycle's
//! history through the request cache, and checks whether the reported usage
//! covers the cycle's plan history.

use crate::context::MeteringContext;
use crate::free::{FreeQuantities, derive_free_quantities};
use async_trait::async_trait;
use tally_core::cycle::{BillingCycle, inclusive_duration};
use tally_core::ids::{RevisionId, UsageGroupName};
use tally_core::license::{License, RevisionTransition, UsageGroupInfo};
use tally_core::usage::{PlanHistoryRecord, UsageRecord};
use tally_core::{Error, Result};
use tracing::{debug, info, warn};

/// Duration sums compared by the completeness check, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletenessReport {
    /// Sum of inclusive plan-history segment durations.
    pub expected_seconds: i64,
    /// Sum of inclusive usage-record durations.
    pub reported_seconds: i64,
}

impl CompletenessReport {
    /// Sum the inclusive durations of both sides. Fails with
    /// `Error::Internal` if a duration or either sum overflows `i64`.
    pub fn from_parts(plan_history: &[PlanHistoryRecord], usage: &[UsageRecord]) -> Result<Self> {
        Ok(Self {
            expected_seconds: total_seconds(plan_history.iter().map(PlanHistoryRecord::duration))?,
            reported_seconds: total_seconds(usage.iter().map(UsageRecord::duration))?,
        })
    }

    /// Equal sums only. Overlapping or gapped records that happen to add up
    /// to the cycle's duration also pass; callers must report
    /// non-overlapping, cycle-bounded intervals.
    pub fn is_complete(&self) -> bool {
        self.expected_seconds == self.reported_seconds
    }

    /// Seconds of plan history not yet covered by usage. Negative when more
    /// usage time was reported than the plan history spans.
    pub fn missing_seconds(&self) -> i64 {
        self.expected_seconds.saturating_sub(self.reported_seconds)
    }
}

fn total_seconds(mut durations: impl Iterator<Item = Option<i64>>) -> Result<i64> {
    durations
        .try_fold(0i64, |total, duration| duration.and_then(|d| total.checked_add(d)))
        .ok_or_else(|| Error::Internal("duration sum overflows i64".to_string()))
}

/// Sum of record quantities. Fails with `Error::Internal` on overflow.
pub(crate) fn total_quantity(records: &[UsageRecord]) -> Result<u64> {
    records
        .iter()
        .try_fold(0u64, |total, r| total.checked_add(r.quantity))
        .ok_or_else(|| Error::Internal("usage quantity sum overflows u64".to_string()))
}

/// State and behavior shared by all usage-group variants.
pub struct UsageGroupBase {
    license: License,
    name: UsageGroupName,
    info: UsageGroupInfo,
    scheduled_properties: Vec<String>,
    ctx: MeteringContext,
}

impl UsageGroupBase {
    pub fn new(
        license: License,
        name: UsageGroupName,
        info: UsageGroupInfo,
        ctx: MeteringContext,
    ) -> Self {
        Self {
            license,
            name,
            info,
            scheduled_properties: Vec::new(),
            ctx,
        }
    }

    /// License properties whose changes must wait for the cycle to end.
    pub fn with_scheduled_properties(mut self, properties: Vec<String>) -> Self {
        self.scheduled_properties = properties;
        self
    }

    pub fn license(&self) -> &License {
        &self.license
    }

    pub fn name(&self) -> &UsageGroupName {
        &self.name
    }

    pub fn info(&self) -> &UsageGroupInfo {
        &self.info
    }

    pub fn context(&self) -> &MeteringContext {
        &self.ctx
    }

    pub fn schedules(&self, property: &str) -> bool {
        self.scheduled_properties.iter().any(|p| p == property)
    }

    /// Record usage against an active revision of this license. Rejects
    /// intervals that are inverted or whose span does not fit in an `i64`.
    pub async fn add_usage(
        &self,
        revision_id: RevisionId,
        quantity: u64,
        start: i64,
        end: i64,
    ) -> Result<UsageRecord> {
        if end < start || inclusive_duration(start, end).is_none() {
            return Err(Error::InvalidUsageInterval { start, end });
        }

        let revision = self.ctx.revisions().load(revision_id).await?;
        if revision.license_id != self.license.id {
            return Err(Error::RevisionNotFound(format!(
                "{} on license {}",
                revision_id, self.license.id
            )));
        }
        if !revision.is_active() {
            warn!(
                license_id = %self.license.id,
                revision_id = %revision_id,
                status = ?revision.status,
                group = %self.name,
                "Rejected usage for non-active revision"
            );
            return Err(Error::NonActiveRevisionUsage {
                revision_id,
                status: revision.status,
            });
        }

        let record = UsageRecord::new(
            self.license.id,
            revision_id,
            self.name.clone(),
            quantity,
            start,
            end,
        );
        self.ctx.cache().record(&record, self.ctx.usage()).await?;

        info!(
            license_id = %self.license.id,
            revision_id = %revision_id,
            group = %self.name,
            quantity,
            start,
            end,
            "Recorded usage"
        );
        Ok(record)
    }

    /// The given cycle, or the license's current one.
    pub async fn resolve_cycle(&self, cycle: Option<&BillingCycle>) -> Result<BillingCycle> {
        match cycle {
            Some(cycle) => Ok(*cycle),
            None => self.ctx.cycles().current(self.license.id).await,
        }
    }

    /// This group's records within the cycle, ordered by start.
    pub async fn usage_history(&self, cycle: &BillingCycle) -> Result<Vec<UsageRecord>> {
        let history = self
            .ctx
            .cache()
            .get_or_load(self.license.id, cycle, self.ctx.usage())
            .await?;

        let mut records = history.get(&self.name).cloned().unwrap_or_default();
        records.sort_by_key(|r| (r.start, r.end));
        Ok(records)
    }

    pub async fn plan_history(&self, cycle: &BillingCycle) -> Result<Vec<PlanHistoryRecord>> {
        self.ctx
            .plan_history()
            .list_for_cycle(self.license.id, cycle)
            .await
    }

    pub async fn free_quantities(&self, cycle: &BillingCycle) -> Result<FreeQuantities> {
        let plan_history = self.plan_history(cycle).await?;
        Ok(derive_free_quantities(&self.name, &plan_history))
    }

    pub async fn completeness(
        &self,
        cycle: &BillingCycle,
        usage: &[UsageRecord],
    ) -> Result<CompletenessReport> {
        let plan_history = self.plan_history(cycle).await?;
        let report = CompletenessReport::from_parts(&plan_history, usage)?;

        debug!(
            license_id = %self.license.id,
            cycle_id = %cycle.id,
            group = %self.name,
            expected = report.expected_seconds,
            reported = report.reported_seconds,
            "Checked usage completeness"
        );
        Ok(report)
    }
}

/// Capability interface implemented by every usage-group variant.
///
/// Variants supply [`UsageGroup::base`] and [`UsageGroup::kind`] and override
/// only the behavior that differs from the shared defaults.
#[async_trait]
pub trait UsageGroup: Send + Sync {
    fn base(&self) -> &UsageGroupBase;

    /// Registry kind of this implementation.
    fn kind(&self) -> &'static str;

    fn name(&self) -> &UsageGroupName {
        self.base().name()
    }

    /// Whether a change to the named license property must be deferred until
    /// the active billing cycle ends.
    fn enforce_change_scheduling(&self, property: &str) -> bool {
        self.base().schedules(property)
    }

    /// Record usage. Fails with `Error::NonActiveRevisionUsage` unless the
    /// revision is currently active, in which case nothing is stored.
    async fn add_usage(
        &self,
        revision_id: RevisionId,
        quantity: u64,
        start: i64,
        end: i64,
    ) -> Result<UsageRecord> {
        self.base().add_usage(revision_id, quantity, start, end).await
    }

    /// Aggregate usage for the cycle, the current one when `None`.
    async fn current_usage(&self, cycle: Option<&BillingCycle>) -> Result<u64> {
        let cycle = self.base().resolve_cycle(cycle).await?;
        let history = self.usage_history(&cycle).await?;
        total_quantity(&history)
    }

    async fn usage_history(&self, cycle: &BillingCycle) -> Result<Vec<UsageRecord>> {
        self.base().usage_history(cycle).await
    }

    /// Records left to bill once free allowances are applied.
    async fn chargeable_usage(&self, cycle: &BillingCycle) -> Result<Vec<UsageRecord>> {
        self.usage_history(cycle).await
    }

    async fn free_quantities(&self, cycle: &BillingCycle) -> Result<FreeQuantities> {
        self.base().free_quantities(cycle).await
    }

    async fn completeness(&self, cycle: &BillingCycle) -> Result<CompletenessReport> {
        let usage = self.usage_history(cycle).await?;
        self.base().completeness(cycle, &usage).await
    }

    /// True when reported usage durations add up to the cycle's plan history.
    async fn is_complete(&self, cycle: &BillingCycle) -> Result<bool> {
        Ok(self.completeness(cycle).await?.is_complete())
    }

    /// Called once per revision transition of the license.
    async fn on_revision_change(&self, _transition: &RevisionTransition) -> Result<()> {
        Ok(())
    }
}
