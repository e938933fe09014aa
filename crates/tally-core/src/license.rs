//! License and license revision types.

use crate::ids::{LicenseId, PlanId, RevisionId, UsageGroupName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle status shared by licenses and their revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LicenseStatus {
    Pending,
    Active,
    Suspended,
    Cancelled,
    Expired,
}

impl LicenseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseStatus::Pending => "PENDING",
            LicenseStatus::Active => "ACTIVE",
            LicenseStatus::Suspended => "SUSPENDED",
            LicenseStatus::Cancelled => "CANCELLED",
            LicenseStatus::Expired => "EXPIRED",
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(LicenseStatus::Pending),
            "ACTIVE" => Some(LicenseStatus::Active),
            "SUSPENDED" => Some(LicenseStatus::Suspended),
            "CANCELLED" => Some(LicenseStatus::Cancelled),
            "EXPIRED" => Some(LicenseStatus::Expired),
            _ => None,
        }
    }
}

/// Static configuration of one usage group on a plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageGroupInfo {
    /// Implementation kind (e.g. `metered`, `seats`). Falls back to the
    /// registry mapping when absent.
    #[serde(default)]
    pub kind: Option<String>,
    /// Allowance excluded from chargeable usage for this revision.
    #[serde(default)]
    pub free_quantity: u64,
    /// Variant-specific settings.
    #[serde(default)]
    pub settings: HashMap<String, serde_json::Value>,
}

impl UsageGroupInfo {
    pub fn with_free_quantity(free_quantity: u64) -> Self {
        Self {
            free_quantity,
            ..Self::default()
        }
    }
}

/// Immutable snapshot of a license's plan and status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseRevision {
    pub id: RevisionId,
    pub license_id: LicenseId,
    pub status: LicenseStatus,
    pub product_id: PlanId,
    /// Usage groups declared by the plan this revision bills.
    #[serde(default)]
    pub usage_groups: HashMap<UsageGroupName, UsageGroupInfo>,
    /// Plan attributes read by predicates such as postpaid billing.
    #[serde(default)]
    pub plan_attributes: HashMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl LicenseRevision {
    pub fn is_active(&self) -> bool {
        self.status == LicenseStatus::Active
    }

    pub fn usage_group(&self, name: &UsageGroupName) -> Option<&UsageGroupInfo> {
        self.usage_groups.get(name)
    }
}

/// Subscription license. Usage is never attributed to the license directly,
/// only through one of its revisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct License {
    pub id: LicenseId,
    pub status: LicenseStatus,
    pub product_id: PlanId,
    pub current_revision: RevisionId,
    pub created_at: DateTime<Utc>,
}

impl License {
    /// Build the license view of a revision.
    pub fn from_revision(revision: &LicenseRevision, created_at: DateTime<Utc>) -> Self {
        Self {
            id: revision.license_id,
            status: revision.status,
            product_id: revision.product_id,
            current_revision: revision.id,
            created_at,
        }
    }
}

/// License property name for status changes.
pub const PROPERTY_STATUS: &str = "status";
/// License property name for plan changes.
pub const PROPERTY_PRODUCT: &str = "product";

/// A revision change: the superseded revision (absent on purchase) and its
/// replacement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionTransition {
    pub previous: Option<LicenseRevision>,
    pub current: LicenseRevision,
}

impl RevisionTransition {
    pub fn new(previous: Option<LicenseRevision>, current: LicenseRevision) -> Self {
        Self { previous, current }
    }

    pub fn license_id(&self) -> LicenseId {
        self.current.license_id
    }

    pub fn status_changed(&self) -> bool {
        self.previous
            .as_ref()
            .is_none_or(|prev| prev.status != self.current.status)
    }

    pub fn plan_changed(&self) -> bool {
        self.previous
            .as_ref()
            .is_none_or(|prev| prev.product_id != self.current.product_id)
    }

    /// Property names that differ between the two revisions.
    pub fn changed_properties(&self) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.status_changed() {
            changed.push(PROPERTY_STATUS);
        }
        if self.plan_changed() {
            changed.push(PROPERTY_PRODUCT);
        }
        changed
    }
}
