//! Test fixtures for creating sample data.

use chrono::Utc;
use std::collections::HashMap;
use tally_core::cycle::BillingCycle;
use tally_core::ids::{LicenseId, PlanId, RevisionId, UsageGroupName};
use tally_core::license::{License, LicenseRevision, LicenseStatus, UsageGroupInfo};

/// Factory for licenses and their revisions.
pub struct LicenseFixture;

impl LicenseFixture {
    /// A license on a fresh plan, with the given active revision.
    pub fn license(revision: &LicenseRevision) -> License {
        License::from_revision(revision, Utc::now())
    }

    /// An active revision of a new license with an `api_calls` metered group.
    pub fn metered(free_quantity: u64) -> LicenseRevision {
        Self::revision(
            LicenseId::new(),
            LicenseStatus::Active,
            &[("api_calls", "metered", free_quantity)],
        )
    }

    /// A revision of `license_id` declaring `(name, kind, free_quantity)` groups.
    pub fn revision(
        license_id: LicenseId,
        status: LicenseStatus,
        groups: &[(&str, &str, u64)],
    ) -> LicenseRevision {
        LicenseRevision {
            id: RevisionId::new(),
            license_id,
            status,
            product_id: PlanId::new(),
            usage_groups: groups
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
                .collect(),
            plan_attributes: HashMap::from([("postpaid".to_string(), serde_json::json!(true))]),
            created_at: Utc::now(),
        }
    }

    /// The next revision of `previous`, on a new plan with `groups`.
    pub fn successor(previous: &LicenseRevision, groups: &[(&str, &str, u64)]) -> LicenseRevision {
        Self::revision(previous.license_id, LicenseStatus::Active, groups)
    }
}

/// Factory for billing cycles.
pub struct CycleFixture;

impl CycleFixture {
    /// A cycle of `seconds` length starting at `start`.
    pub fn starting_at(license_id: LicenseId, start: i64, seconds: i64) -> BillingCycle {
        BillingCycle::new(license_id, start, start + seconds - 1)
    }

    /// A 30-day cycle starting at the Unix epoch offset `start`.
    pub fn monthly(license_id: LicenseId, start: i64) -> BillingCycle {
        Self::starting_at(license_id, start, 30 * 24 * 60 * 60)
    }
}
