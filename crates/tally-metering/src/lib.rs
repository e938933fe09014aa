//! Usage metering engine for Tally.
//!
//! Records usage against license revisions, reconciles it with billing
//! cycles, and decides whether a cycle's usage reporting is complete.

pub mod cache;
pub mod config;
pub mod context;
pub mod free;
pub mod group;
pub mod groups;
pub mod lifecycle;
pub mod memory;
pub mod postpaid;
pub mod registry;

pub use cache::UsageHistoryCache;
pub use config::MeteringConfig;
pub use context::MeteringContext;
pub use free::{FreeQuantities, derive_free_quantities};
pub use group::{CompletenessReport, UsageGroup, UsageGroupBase};
pub use groups::{MeteredUsageGroup, SeatUsageGroup};
pub use lifecycle::RevisionChangeDispatcher;
pub use postpaid::is_postpaid;
pub use registry::{UsageGroupFactory, UsageGroupRegistry};
