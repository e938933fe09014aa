//! Usage-group instantiation by kind.

mod common;

use common::{API_CALLS, Harness, SEATS};
use tally_core::Error;
use tally_core::ids::UsageGroupName;
use tally_core::license::{LicenseStatus, PROPERTY_PRODUCT, PROPERTY_STATUS, UsageGroupInfo};
use tally_metering::{
    MeteredUsageGroup, MeteringConfig, SeatUsageGroup, UsageGroupRegistry,
};

#[test]
fn test_builtin_kinds() {
    let registry = UsageGroupRegistry::with_builtin();
    assert_eq!(registry.kinds(), vec!["metered", "seats"]);
}

#[test]
fn test_kind_resolution_order() {
    let mut registry = UsageGroupRegistry::with_builtin();
    registry.map_group("editors", SeatUsageGroup::KIND);

    let name = UsageGroupName::from("editors");
    let explicit = UsageGroupInfo {
        kind: Some(MeteredUsageGroup::KIND.to_string()),
        ..UsageGroupInfo::default()
    };

    assert_eq!(registry.resolve_kind(&name, &explicit).unwrap(), "metered");
    assert_eq!(
        registry.resolve_kind(&name, &UsageGroupInfo::default()).unwrap(),
        "seats"
    );
    assert_eq!(
        registry
            .resolve_kind(&UsageGroupName::from("storage"), &UsageGroupInfo::default())
            .unwrap(),
        "metered"
    );
}

#[test]
fn test_unmapped_group_without_default_fails() {
    let registry = UsageGroupRegistry::new();
    let err = registry
        .resolve_kind(&UsageGroupName::from("storage"), &UsageGroupInfo::default())
        .unwrap_err();
    assert!(matches!(err, Error::UnknownUsageGroup(_)));
}

#[test]
fn test_for_revision_builds_every_declared_group() {
    let mut h = Harness::new(1000, 1999);
    let r1 = h.revision(
        LicenseStatus::Active,
        &[(SEATS, "seats", 0), (API_CALLS, "metered", 0)],
    );

    let groups = h.registry.for_revision(&h.license, &r1, &h.ctx).unwrap();
    let built: Vec<(&str, &str)> = groups.iter().map(|g| (g.name().as_str(), g.kind())).collect();

    assert_eq!(built, vec![(API_CALLS, "metered"), (SEATS, "seats")]);
}

#[test]
fn test_group_not_on_revision() {
    let mut h = Harness::new(1000, 1999);
    let r1 = h.revision(LicenseStatus::Active, &[(API_CALLS, "metered", 0)]);

    let err = h
        .registry
        .group(&h.license, &r1, &UsageGroupName::from(SEATS), &h.ctx)
        .err()
        .expect("missing group");
    assert!(matches!(err, Error::UsageGroupNotConfigured { .. }));
}

#[test]
fn test_default_scheduling_is_permissive() {
    let mut h = Harness::new(1000, 1999);
    let r1 = h.revision(LicenseStatus::Active, &[(API_CALLS, "metered", 0)]);
    let group = h.group(&r1, API_CALLS);

    for property in [PROPERTY_STATUS, PROPERTY_PRODUCT, "name", ""] {
        assert!(!group.enforce_change_scheduling(property));
    }
}

#[test]
fn test_seats_schedule_status_and_plan() {
    let mut h = Harness::new(1000, 1999);
    let r1 = h.revision(LicenseStatus::Active, &[(SEATS, "seats", 0)]);
    let group = h.group(&r1, SEATS);

    assert!(group.enforce_change_scheduling(PROPERTY_STATUS));
    assert!(group.enforce_change_scheduling(PROPERTY_PRODUCT));
    assert!(!group.enforce_change_scheduling("name"));
}

#[test]
fn test_config_adds_scheduled_properties() {
    let config = MeteringConfig::from_yaml_str("scheduled_properties:\n  metered: [product]\n")
        .unwrap();
    let mut h = Harness::new(1000, 1999);
    h.registry = UsageGroupRegistry::from_config(&config).unwrap();
    let r1 = h.revision(LicenseStatus::Active, &[(API_CALLS, "metered", 0)]);
    let group = h.group(&r1, API_CALLS);

    assert!(group.enforce_change_scheduling(PROPERTY_PRODUCT));
    assert!(!group.enforce_change_scheduling(PROPERTY_STATUS));
}

#[test]
fn test_config_with_unknown_kind_is_rejected() {
    let config = MeteringConfig::from_yaml_str("groups:\n  api_calls: tiered\n").unwrap();
    let err = UsageGroupRegistry::from_config(&config).err().expect("invalid");
    assert!(matches!(err, Error::Config(_)));
}
