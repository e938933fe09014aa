//! Postpaid billing predicate for rule evaluation.

use tally_core::license::LicenseRevision;

/// Boolean plan attribute marking postpaid plans.
pub const POSTPAID_ATTRIBUTE: &str = "postpaid";
/// String plan attribute naming the billing mode.
pub const BILLING_ATTRIBUTE: &str = "billing";

/// Whether the revision's plan bills usage in arrears.
pub fn is_postpaid(revision: &LicenseRevision) -> bool {
    let attributes = &revision.plan_attributes;

    if let Some(flag) = attributes.get(POSTPAID_ATTRIBUTE).and_then(|v| v.as_bool()) {
        return flag;
    }

    attributes
        .get(BILLING_ATTRIBUTE)
        .and_then(|v| v.as_str())
        .is_some_and(|mode| mode.eq_ignore_ascii_case("postpaid"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use std::collections::HashMap;
    use tally_core::ids::{LicenseId, PlanId, RevisionId};
    use tally_core::license::LicenseStatus;

    fn revision(attributes: HashMap<String, serde_json::Value>) -> LicenseRevision {
        LicenseRevision {
            id: RevisionId::new(),
            license_id: LicenseId::new(),
            status: LicenseStatus::Active,
            product_id: PlanId::new(),
            usage_groups: HashMap::new(),
            plan_attributes: attributes,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_flag_attribute() {
        let attrs = HashMap::from([(POSTPAID_ATTRIBUTE.to_string(), json!(true))]);
        assert!(is_postpaid(&revision(attrs)));

        let attrs = HashMap::from([(POSTPAID_ATTRIBUTE.to_string(), json!(false))]);
        assert!(!is_postpaid(&revision(attrs)));
    }

    #[test]
    fn test_billing_mode_attribute() {
        let attrs = HashMap::from([(BILLING_ATTRIBUTE.to_string(), json!("Postpaid"))]);
        assert!(is_postpaid(&revision(attrs)));

        let attrs = HashMap::from([(BILLING_ATTRIBUTE.to_string(), json!("prepaid"))]);
        assert!(!is_postpaid(&revision(attrs)));
    }

    #[test]
    fn test_missing_attributes_are_prepaid() {
        assert!(!is_postpaid(&revision(HashMap::new())));
    }
}
