//! Completeness of usage reporting against plan history.

mod common;

use common::{API_CALLS, Harness, SEATS};
use tally_core::Error;
use tally_core::license::LicenseStatus;

#[tokio::test]
async fn test_identical_partition_is_complete() {
    let mut h = Harness::new(1000, 2999);
    let r1 = h.revision(LicenseStatus::Active, &[(API_CALLS, "metered", 0)]);
    let group = h.group(&r1, API_CALLS);
    group.add_usage(r1.id, 5, 1000, 1999).await.unwrap();

    h.revisions.set_status(r1.id, LicenseStatus::Expired).unwrap();
    let r2 = h.revision(LicenseStatus::Active, &[(API_CALLS, "metered", 0)]);
    group.add_usage(r2.id, 3, 2000, 2999).await.unwrap();

    h.segment(&r1, 1000, 1999);
    h.segment(&r2, 2000, 2999);

    assert!(group.is_complete(&h.cycle).await.unwrap());
}

#[tokio::test]
async fn test_shortened_usage_is_incomplete() {
    let mut h = Harness::new(1000, 2999);
    let r1 = h.revision(LicenseStatus::Active, &[(API_CALLS, "metered", 0)]);
    let group = h.group(&r1, API_CALLS);
    h.segment(&r1, 1000, 1999);
    h.segment(&r1, 2000, 2999);

    group.add_usage(r1.id, 5, 1000, 1500).await.unwrap();

    let report = group.completeness(&h.cycle).await.unwrap();
    assert!(!report.is_complete());
    assert_eq!(report.expected_seconds, 2000);
    assert_eq!(report.reported_seconds, 501);
    assert!(!group.is_complete(&h.cycle).await.unwrap());
}

#[tokio::test]
async fn test_missing_usage_is_incomplete() {
    let mut h = Harness::new(1000, 1999);
    let r1 = h.revision(LicenseStatus::Active, &[(API_CALLS, "metered", 0)]);
    h.segment(&r1, 1000, 1999);

    let group = h.group(&r1, API_CALLS);
    assert!(!group.is_complete(&h.cycle).await.unwrap());
}

#[tokio::test]
async fn test_groups_are_judged_independently() {
    let mut h = Harness::new(1000, 1999);
    let r1 = h.revision(
        LicenseStatus::Active,
        &[(API_CALLS, "metered", 0), (SEATS, "seats", 0)],
    );
    h.segment(&r1, 1000, 1999);

    let calls = h.group(&r1, API_CALLS);
    let seats = h.group(&r1, SEATS);
    calls.add_usage(r1.id, 10, 1000, 1999).await.unwrap();

    assert!(calls.is_complete(&h.cycle).await.unwrap());
    assert!(!seats.is_complete(&h.cycle).await.unwrap());
}

#[tokio::test]
async fn test_usage_outside_cycle_is_ignored() {
    let mut h = Harness::new(1000, 1999);
    let r1 = h.revision(LicenseStatus::Active, &[(API_CALLS, "metered", 0)]);
    h.segment(&r1, 1000, 1999);

    let group = h.group(&r1, API_CALLS);
    group.add_usage(r1.id, 1, 1000, 1999).await.unwrap();
    group.add_usage(r1.id, 1, 2000, 2999).await.unwrap();

    assert!(group.is_complete(&h.cycle).await.unwrap());
    assert_eq!(group.usage_history(&h.cycle).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_overflowing_duration_sum_is_an_error() {
    let mut h = Harness::new(0, i64::MAX - 1);
    let r1 = h.revision(LicenseStatus::Active, &[(API_CALLS, "metered", 0)]);
    let group = h.group(&r1, API_CALLS);

    group.add_usage(r1.id, 1, 0, i64::MAX - 1).await.unwrap();
    group.add_usage(r1.id, 1, 0, 0).await.unwrap();

    let err = group.completeness(&h.cycle).await.unwrap_err();
    assert!(matches!(err, Error::Internal(_)));
    assert!(group.is_complete(&h.cycle).await.is_err());
}
