//! Usage records, plan history, and free allowances.

use crate::cycle::inclusive_duration;
use crate::ids::{LicenseId, RevisionId, UsageGroupName, UsageRecordId};
use crate::license::LicenseRevision;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One usage observation, attributed to the revision that was active when it
/// was recorded. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: UsageRecordId,
    pub license_id: LicenseId,
    pub revision_id: RevisionId,
    pub usage_group: UsageGroupName,
    pub quantity: u64,
    /// Inclusive Unix-second bounds.
    pub start: i64,
    pub end: i64,
    pub recorded_at: DateTime<Utc>,
}

impl UsageRecord {
    pub fn new(
        license_id: LicenseId,
        revision_id: RevisionId,
        usage_group: UsageGroupName,
        quantity: u64,
        start: i64,
        end: i64,
    ) -> Self {
        Self {
            id: UsageRecordId::new(),
            license_id,
            revision_id,
            usage_group,
            quantity,
            start,
            end,
            recorded_at: Utc::now(),
        }
    }

    pub fn duration(&self) -> Option<i64> {
        inclusive_duration(self.start, self.end)
    }
}

/// Time segment of a cycle during which a revision's plan was billed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanHistoryRecord {
    pub revision: LicenseRevision,
    pub revision_id: RevisionId,
    pub start: i64,
    pub end: i64,
}

impl PlanHistoryRecord {
    pub fn new(revision: LicenseRevision, start: i64, end: i64) -> Self {
        Self {
            revision_id: revision.id,
            revision,
            start,
            end,
        }
    }

    pub fn duration(&self) -> Option<i64> {
        inclusive_duration(self.start, self.end)
    }
}

/// Free allowance for one revision within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeQuantity {
    pub quantity: u64,
    pub start: i64,
    pub end: i64,
}
