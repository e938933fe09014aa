//! Billing cycle types.

use crate::ids::{BillingCycleId, LicenseId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of seconds covered by the inclusive interval `[start, end]`.
///
/// Consecutive segments end one second before the next begins, so a cycle
/// `[1000, 1999]` lasts 1000 seconds. `None` when the span does not fit in
/// an `i64`.
pub fn inclusive_duration(start: i64, end: i64) -> Option<i64> {
    end.checked_sub(start)?.checked_add(1)
}

/// Reconciliation period with inclusive Unix-second bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillingCycle {
    pub id: BillingCycleId,
    pub license_id: LicenseId,
    pub start: i64,
    pub end: i64,
}

impl BillingCycle {
    pub fn new(license_id: LicenseId, start: i64, end: i64) -> Self {
        Self {
            id: BillingCycleId::new(),
            license_id,
            start,
            end,
        }
    }

    pub fn duration(&self) -> Option<i64> {
        inclusive_duration(self.start, self.end)
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }

    pub fn overlaps(&self, start: i64, end: i64) -> bool {
        start <= self.end && end >= self.start
    }

    pub fn starts_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.start, 0)
    }

    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.end, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inclusive_duration() {
        assert_eq!(inclusive_duration(1000, 1999), Some(1000));
        assert_eq!(inclusive_duration(5, 5), Some(1));
    }

    #[test]
    fn test_inclusive_duration_overflow() {
        assert_eq!(inclusive_duration(i64::MIN, i64::MAX), None);
        assert_eq!(inclusive_duration(0, i64::MAX), None);
        assert_eq!(inclusive_duration(1, i64::MAX), Some(i64::MAX));
    }

    #[test]
    fn test_cycle_bounds_are_inclusive() {
        let cycle = BillingCycle::new(LicenseId::new(), 1000, 2999);
        assert!(cycle.contains(1000));
        assert!(cycle.contains(2999));
        assert!(!cycle.contains(3000));
        assert!(cycle.overlaps(2999, 4000));
        assert!(!cycle.overlaps(3000, 4000));
        assert_eq!(cycle.duration(), Some(2000));
    }
}
