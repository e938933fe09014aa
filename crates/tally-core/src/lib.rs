//! Tally Core
//!
//! Domain types, port traits, and error handling for Tally usage metering.
//! This crate performs no I/O and defines the shared vocabulary used by the
//! metering engine and the storage adapters.

pub mod cycle;
pub mod error;
pub mod ids;
pub mod license;
pub mod ports;
pub mod usage;

pub use error::{Error, Result};
pub use ids::*;
