//! # Conditional Write Vocabulary
//!
//! Mutations are data, not closures, so that every backend can translate
//! them: the memory store applies them to a record under its write lock,
//! the Postgres store renders them into a single `UPDATE ... WHERE`.

use chrono::Duration;
use keyward_core::{ClientId, License, Timestamp};

use crate::error::StoreError;

/// Condition the current record must satisfy for a mutation to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// Apply unconditionally (last writer wins).
    Always,
    /// Apply only if no client has claimed the key and it has not been
    /// deactivated. This is the compare-and-set target of first-use binding.
    Bindable,
}

impl Precondition {
    /// Whether the condition holds on `license`.
    pub fn holds(&self, license: &License) -> bool {
        match self {
            Self::Always => true,
            Self::Bindable => license.is_bindable(),
        }
    }
}

/// A change to a license record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Claim the key for a client: sets `consumer_id`, `consumed_at` and
    /// `is_active = true`.
    Bind {
        consumer_id: ClientId,
        consumed_at: Timestamp,
    },
    /// Clear `is_active` and stamp `deactivated_at` (first stamp wins).
    Deactivate { at: Timestamp },
    /// Push `expires_at` forward by a duration, relative to the stored
    /// value at the moment of the write.
    ExtendExpiry { by: Duration },
}

impl Mutation {
    /// Short name for logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bind { .. } => "bind",
            Self::Deactivate { .. } => "deactivate",
            Self::ExtendExpiry { .. } => "extend_expiry",
        }
    }

    /// Apply this mutation to `license` in place.
    ///
    /// `Bind` refuses to touch a record that is already bound or has been
    /// deactivated, whatever precondition the caller supplied: the consumer
    /// is write-once at the storage layer too.
    pub fn apply(&self, license: &mut License) -> Result<(), StoreError> {
        match self {
            Self::Bind {
                consumer_id,
                consumed_at,
            } => {
                if !license.is_bindable() {
                    return Err(StoreError::Conflict(license.id));
                }
                license.consumer_id = Some(consumer_id.clone());
                license.consumed_at = Some(*consumed_at);
                license.is_active = true;
            }
            Self::Deactivate { at } => {
                license.is_active = false;
                license.deactivated_at.get_or_insert(*at);
            }
            Self::ExtendExpiry { by } => {
                license.expires_at = license
                    .expires_at
                    .checked_add(*by)
                    .map_err(|e| StoreError::Rejected(e.to_string()))?;
            }
        }
        Ok(())
    }
}
