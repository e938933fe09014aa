//! Fan-out of license revision transitions to usage groups.

use crate::context::MeteringContext;
use crate::group::UsageGroup;
use crate::registry::UsageGroupRegistry;
use std::collections::BTreeMap;
use tally_core::Result;
use tally_core::ids::UsageGroupName;
use tally_core::license::{License, LicenseRevision, RevisionTransition};
use tracing::info;

/// Notifies usage groups of revision transitions and answers scheduling
/// questions for pending license changes.
pub struct RevisionChangeDispatcher<'a> {
    registry: &'a UsageGroupRegistry,
    ctx: MeteringContext,
}

impl<'a> RevisionChangeDispatcher<'a> {
    pub fn new(registry: &'a UsageGroupRegistry, ctx: MeteringContext) -> Self {
        Self { registry, ctx }
    }

    /// Groups touched by the transition: those of the current revision, plus
    /// groups only the previous revision declared.
    fn affected_groups(
        &self,
        license: &License,
        transition: &RevisionTransition,
    ) -> Result<Vec<Box<dyn UsageGroup>>> {
        let mut declared: BTreeMap<&UsageGroupName, &LicenseRevision> = BTreeMap::new();
        if let Some(previous) = &transition.previous {
            for name in previous.usage_groups.keys() {
                declared.insert(name, previous);
            }
        }
        for name in transition.current.usage_groups.keys() {
            declared.insert(name, &transition.current);
        }

        declared
            .into_iter()
            .map(|(name, revision)| self.registry.group(license, revision, name, &self.ctx))
            .collect()
    }

    /// Fire `on_revision_change` once per affected group. The first failing
    /// group aborts the dispatch and its error is returned.
    pub async fn dispatch(
        &self,
        license: &License,
        transition: &RevisionTransition,
    ) -> Result<Vec<UsageGroupName>> {
        let groups = self.affected_groups(license, transition)?;
        let mut notified = Vec::with_capacity(groups.len());

        for group in &groups {
            group.on_revision_change(transition).await?;
            notified.push(group.name().clone());
        }

        info!(
            license_id = %license.id,
            revision_id = %transition.current.id,
            groups = notified.len(),
            changed = ?transition.changed_properties(),
            "Dispatched revision change"
        );
        Ok(notified)
    }

    /// Whether any group of `revision` defers changes to `property`.
    pub fn requires_scheduling(
        &self,
        license: &License,
        revision: &LicenseRevision,
        property: &str,
    ) -> Result<bool> {
        let groups = self.registry.for_revision(license, revision, &self.ctx)?;
        Ok(groups.iter().any(|g| g.enforce_change_scheduling(property)))
    }

    /// Changed properties of a proposed transition that must wait for the
    /// cycle boundary, judged by the groups of the outgoing revision.
    pub fn deferred_properties(
        &self,
        license: &License,
        transition: &RevisionTransition,
    ) -> Result<Vec<&'static str>> {
        let Some(previous) = &transition.previous else {
            return Ok(Vec::new());
        };

        let groups = self.registry.for_revision(license, previous, &self.ctx)?;
        Ok(transition
            .changed_properties()
            .into_iter()
            .filter(|property| groups.iter().any(|g| g.enforce_change_scheduling(property)))
            .collect())
    }
}
