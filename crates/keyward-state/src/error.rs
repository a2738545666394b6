//! Engine error taxonomy.
//!
//! Soft verification outcomes (`not found`, `expired`, `inactive`,
//! `bound_to_another_client`) are not errors; they are values of
//! [`Verification`](crate::Verification). The variants here are genuine
//! failures.

use keyward_core::{LicenseId, ValidationError};
use keyward_store::StoreError;
use thiserror::Error;

/// Failure of a lifecycle operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The request itself is invalid (empty plan, bad duration, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),

    /// An id-addressed operation named a license that does not exist.
    #[error("license {0} not found")]
    NotFound(LicenseId),

    /// The store failed, or retries were exhausted.
    #[error("storage unavailable: {0}")]
    Storage(String),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::Rejected(msg) => {
                Self::InvalidArgument(ValidationError::TimestampOutOfRange(msg))
            }
            other => Self::Storage(other.to_string()),
        }
    }
}
