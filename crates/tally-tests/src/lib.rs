//! Integration test infrastructure for Tally.
//!
//! This crate provides testcontainers-based infrastructure for running the
//! metering engine against a real PostgreSQL.
//!
//! # Usage
//!
//! ```ignore
//! use tally_tests::TestContext;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let ctx = TestContext::postgres_only().await.unwrap();
//!     let metering = ctx.metering();
//! }
//! ```

pub mod containers;
pub mod context;
pub mod fixtures;

pub use context::TestContext;
pub use fixtures::*;

/// Initialize test logging (call once per test binary).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,tally_metering=debug,tally_db=debug")),
        )
        .with_test_writer()
        .try_init();
}
