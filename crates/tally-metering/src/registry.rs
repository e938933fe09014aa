//! Registry mapping plan usage groups to implementations.

use crate::config::MeteringConfig;
use crate::context::MeteringContext;
use crate::group::{UsageGroup, UsageGroupBase};
use crate::groups::{MeteredUsageGroup, SeatUsageGroup};
use std::collections::HashMap;
use tally_core::ids::UsageGroupName;
use tally_core::license::{License, LicenseRevision, UsageGroupInfo};
use tally_core::{Error, Result};
use tracing::debug;

/// Constructor for one usage-group kind.
pub type UsageGroupFactory = fn(UsageGroupBase) -> Box<dyn UsageGroup>;

/// Explicit factory mapping from kind to implementation.
///
/// A group's kind comes from its plan configuration (`UsageGroupInfo::kind`),
/// then from the group-name mapping, then from the default kind.
pub struct UsageGroupRegistry {
    factories: HashMap<String, UsageGroupFactory>,
    group_kinds: HashMap<String, String>,
    default_kind: Option<String>,
    scheduled_properties: HashMap<String, Vec<String>>,
}

impl UsageGroupRegistry {
    /// An empty registry with no default kind.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            group_kinds: HashMap::new(),
            default_kind: None,
            scheduled_properties: HashMap::new(),
        }
    }

    /// Registry with the built-in `metered` and `seats` kinds, defaulting to
    /// `metered`.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(MeteredUsageGroup::KIND, MeteredUsageGroup::boxed);
        registry.register(SeatUsageGroup::KIND, SeatUsageGroup::boxed);
        registry.default_kind = Some(MeteredUsageGroup::KIND.to_string());
        registry
    }

    /// Built-in kinds configured by `config`. Every kind the configuration
    /// names must be registered.
    pub fn from_config(config: &MeteringConfig) -> Result<Self> {
        let mut registry = Self::with_builtin();
        registry.default_kind = config.default_kind.clone();
        registry.scheduled_properties = config.scheduled_properties.clone();

        for (group, kind) in &config.groups {
            registry.map_group(group, kind);
        }

        let named_kinds = registry
            .default_kind
            .iter()
            .chain(registry.group_kinds.values())
            .chain(registry.scheduled_properties.keys());
        for kind in named_kinds {
            if !registry.factories.contains_key(kind) {
                return Err(Error::Config(format!("unknown usage group kind: {}", kind)));
            }
        }

        Ok(registry)
    }

    pub fn register(&mut self, kind: &str, factory: UsageGroupFactory) {
        debug!(kind = %kind, "Registering usage group kind");
        self.factories.insert(kind.to_string(), factory);
    }

    pub fn map_group(&mut self, group: &str, kind: &str) {
        self.group_kinds.insert(group.to_string(), kind.to_string());
    }

    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Kind that implements the group.
    pub fn resolve_kind<'a>(
        &'a self,
        name: &UsageGroupName,
        info: &'a UsageGroupInfo,
    ) -> Result<&'a str> {
        info.kind
            .as_deref()
            .or_else(|| self.group_kinds.get(name.as_str()).map(String::as_str))
            .or(self.default_kind.as_deref())
            .ok_or_else(|| Error::UnknownUsageGroup(name.to_string()))
    }

    /// Instantiate one usage group bound to `license`.
    pub fn build(
        &self,
        license: &License,
        name: &UsageGroupName,
        info: &UsageGroupInfo,
        ctx: &MeteringContext,
    ) -> Result<Box<dyn UsageGroup>> {
        let kind = self.resolve_kind(name, info)?;
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| Error::UnknownUsageGroup(format!("{} (kind {})", name, kind)))?;

        let scheduled = self
            .scheduled_properties
            .get(kind)
            .cloned()
            .unwrap_or_default();
        let base = UsageGroupBase::new(license.clone(), name.clone(), info.clone(), ctx.clone())
            .with_scheduled_properties(scheduled);

        Ok(factory(base))
    }

    /// The named group as configured on `revision`.
    pub fn group(
        &self,
        license: &License,
        revision: &LicenseRevision,
        name: &UsageGroupName,
        ctx: &MeteringContext,
    ) -> Result<Box<dyn UsageGroup>> {
        let info = revision
            .usage_group(name)
            .ok_or_else(|| Error::UsageGroupNotConfigured {
                group: name.to_string(),
                revision_id: revision.id,
            })?;
        self.build(license, name, info, ctx)
    }

    /// Every group declared by the revision's plan, ordered by name.
    pub fn for_revision(
        &self,
        license: &License,
        revision: &LicenseRevision,
        ctx: &MeteringContext,
    ) -> Result<Vec<Box<dyn UsageGroup>>> {
        let mut names: Vec<&UsageGroupName> = revision.usage_groups.keys().collect();
        names.sort();

        names
            .into_iter()
            .map(|name| self.build(license, name, &revision.usage_groups[name], ctx))
            .collect()
    }
}

impl Default for UsageGroupRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}
