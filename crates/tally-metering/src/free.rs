//! Free-allowance windows derived from plan history.

use std::collections::HashMap;
use tally_core::ids::{RevisionId, UsageGroupName};
use tally_core::usage::{FreeQuantity, PlanHistoryRecord};

/// Free allowance per revision billed within a cycle.
pub type FreeQuantities = HashMap<RevisionId, FreeQuantity>;

/// One window per revision segment, carrying that revision's allowance for
/// `group`.
///
/// A revision whose plan does not declare the group contributes a zero
/// allowance. If a revision appears in more than one segment its window is
/// widened to cover all of them.
pub fn derive_free_quantities(
    group: &UsageGroupName,
    plan_history: &[PlanHistoryRecord],
) -> FreeQuantities {
    let mut windows = FreeQuantities::new();

    for segment in plan_history {
        let quantity = segment
            .revision
            .usage_group(group)
            .map(|info| info.free_quantity)
            .unwrap_or(0);

        windows
            .entry(segment.revision_id)
            .and_modify(|window| {
                window.start = window.start.min(segment.start);
                window.end = window.end.max(segment.end);
            })
            .or_insert(FreeQuantity {
                quantity,
                start: segment.start,
                end: segment.end,
            });
    }

    windows
}
