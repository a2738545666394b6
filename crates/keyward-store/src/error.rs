//! Store error taxonomy.

use keyward_core::LicenseId;
use thiserror::Error;

/// Errors returned by [`LicenseStore`](crate::LicenseStore) implementations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No record with this id.
    #[error("license {0} not found")]
    NotFound(LicenseId),

    /// Another record already holds this key. The caller should generate a
    /// new key and retry.
    #[error("license key already exists")]
    DuplicateKey,

    /// The precondition of a conditional update did not hold, or the
    /// mutation would overwrite write-once state.
    #[error("conditional update on {0} lost to a concurrent change")]
    Conflict(LicenseId),

    /// The mutation would produce an unrepresentable record.
    #[error("mutation rejected: {0}")]
    Rejected(String),

    /// The backend failed or is unavailable.
    #[error("storage backend error: {0}")]
    Backend(String),
}
