//! Built-in usage-group variants.

mod metered;
mod seats;

pub use metered::MeteredUsageGroup;
pub use seats::SeatUsageGroup;
