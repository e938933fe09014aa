//! Shared fixtures for metering tests.

#![allow(dead_code)]

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tally_core::cycle::BillingCycle;
use tally_core::ids::{LicenseId, PlanId, RevisionId, UsageGroupName};
use tally_core::license::{License, LicenseRevision, LicenseStatus, UsageGroupInfo};
use tally_core::usage::PlanHistoryRecord;
use tally_metering::memory::{
    FixedBillingCycle, InMemoryPlanHistory, InMemoryRevisionLookup, InMemoryUsageStore,
};
use tally_metering::{MeteringContext, UsageGroup, UsageGroupRegistry};

pub const API_CALLS: &str = "api_calls";
pub const SEATS: &str = "seats";

/// One license with in-memory collaborators and a current cycle.
pub struct Harness {
    pub revisions: Arc<InMemoryRevisionLookup>,
    pub usage: Arc<InMemoryUsageStore>,
    pub plan_history: Arc<InMemoryPlanHistory>,
    pub registry: UsageGroupRegistry,
    pub license: License,
    pub cycle: BillingCycle,
    pub ctx: MeteringContext,
}

impl Harness {
    pub fn new(cycle_start: i64, cycle_end: i64) -> Self {
        let license_id = LicenseId::new();
        let cycle = BillingCycle::new(license_id, cycle_start, cycle_end);

        let revisions = Arc::new(InMemoryRevisionLookup::new());
        let usage = Arc::new(InMemoryUsageStore::new());
        let plan_history = Arc::new(InMemoryPlanHistory::new());
        let ctx = MeteringContext::new(
            revisions.clone(),
            usage.clone(),
            plan_history.clone(),
            Arc::new(FixedBillingCycle::new(cycle)),
        );

        let license = License {
            id: license_id,
            status: LicenseStatus::Active,
            product_id: PlanId::new(),
            current_revision: RevisionId::new(),
            created_at: Utc::now(),
        };

        Self {
            revisions,
            usage,
            plan_history,
            registry: UsageGroupRegistry::with_builtin(),
            license,
            cycle,
            ctx,
        }
    }

    /// Store a revision declaring `groups` as `(name, kind, free_quantity)`.
    pub fn revision(
        &mut self,
        status: LicenseStatus,
        groups: &[(&str, &str, u64)],
    ) -> LicenseRevision {
        let usage_groups = groups
            .iter()
            .map(|(name, kind, free)| {
                (
                    UsageGroupName::from(*name),
                    UsageGroupInfo {
                        kind: Some(kind.to_string()),
                        free_quantity: *free,
                        settings: HashMap::new(),
                    },
                )
            })
            .collect();

        let revision = LicenseRevision {
            id: RevisionId::new(),
            license_id: self.license.id,
            status,
            product_id: PlanId::new(),
            usage_groups,
            plan_attributes: HashMap::new(),
            created_at: Utc::now(),
        };
        self.revisions.insert(revision.clone());
        if status == LicenseStatus::Active {
            self.license.current_revision = revision.id;
            self.license.product_id = revision.product_id;
        }
        revision
    }

    pub fn segment(&self, revision: &LicenseRevision, start: i64, end: i64) {
        self.plan_history
            .push(PlanHistoryRecord::new(revision.clone(), start, end));
    }

    pub fn group(&self, revision: &LicenseRevision, name: &str) -> Box<dyn UsageGroup> {
        self.registry
            .group(
                &self.license,
                revision,
                &UsageGroupName::from(name),
                &self.ctx,
            )
            .expect("group")
    }
}
