//! Port implementations for PostgreSQL.

mod cycle;
mod plan_history;
mod revision;
mod usage;

pub use cycle::PgBillingCycleProvider;
pub use plan_history::PgPlanHistoryProvider;
pub use revision::PgRevisionLookup;
pub use usage::PgUsageRecordStore;
