//! # Validation Errors
//!
//! Input that cannot become a domain value is rejected at construction
//! with a [`ValidationError`]. Every variant carries enough context to be
//! shown to the caller verbatim.

use thiserror::Error;

/// A value failed domain validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Plan name is empty after trimming.
    #[error("plan must not be empty")]
    EmptyPlan,

    /// Plan name exceeds the maximum length.
    #[error("plan must not exceed {max} characters, got {actual}")]
    PlanTooLong {
        /// Maximum permitted length.
        max: usize,
        /// Length of the rejected value.
        actual: usize,
    },

    /// Client identifier is empty after trimming.
    #[error("client_id must not be empty")]
    EmptyClientId,

    /// Client identifier exceeds the maximum length.
    #[error("client_id must not exceed {max} characters, got {actual}")]
    ClientIdTooLong {
        /// Maximum permitted length.
        max: usize,
        /// Length of the rejected value.
        actual: usize,
    },

    /// Client identifier contains a control character.
    #[error("client_id must not contain control characters")]
    ClientIdControlChar,

    /// Plan name contains a control character.
    #[error("plan must not contain control characters")]
    PlanControlChar,

    /// License duration is zero or negative.
    #[error("duration_days must be positive, got {0}")]
    NonPositiveDuration(i64),

    /// License duration exceeds the supported horizon.
    #[error("duration_days must not exceed {max}, got {actual}")]
    DurationTooLong {
        /// Maximum permitted number of days.
        max: i64,
        /// The rejected number of days.
        actual: i64,
    },

    /// Timestamp arithmetic left the representable range.
    #[error("timestamp out of range: {0}")]
    TimestampOutOfRange(String),
}
