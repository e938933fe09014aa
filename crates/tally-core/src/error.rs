//! Error types for Tally.

use crate::ids::RevisionId;
use crate::license::LicenseStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Usage errors
    #[error("Usage cannot be attributed to revision {revision_id} with status {status:?}")]
    NonActiveRevisionUsage {
        revision_id: RevisionId,
        status: LicenseStatus,
    },

    #[error("Invalid usage interval: [{start}, {end}]")]
    InvalidUsageInterval { start: i64, end: i64 },

    // License errors
    #[error("Revision not found: {0}")]
    RevisionNotFound(String),

    #[error("License not found: {0}")]
    LicenseNotFound(String),

    #[error("Billing cycle not found: {0}")]
    BillingCycleNotFound(String),

    // Usage group errors
    #[error("No usage group implementation registered for: {0}")]
    UnknownUsageGroup(String),

    #[error("Usage group {group} is not configured on revision {revision_id}")]
    UsageGroupNotConfigured {
        group: String,
        revision_id: RevisionId,
    },

    // Infrastructure errors
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
