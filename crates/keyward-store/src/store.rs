//! The storage seam between the lifecycle engine and a backend.

use async_trait::async_trait;
use keyward_core::{License, LicenseId, NewLicense};

use crate::error::StoreError;
use crate::write::{Mutation, Precondition};

/// Durable collection of licenses keyed by id, with a unique key index.
///
/// Implementations must be `Send + Sync` so one instance can be shared
/// across request tasks behind an `Arc`. The trait is object-safe so the
/// backend can be chosen at startup (memory vs. Postgres).
///
/// All mutations are persisted before a call returns `Ok`.
#[async_trait]
pub trait LicenseStore: Send + Sync {
    /// Insert a new, unbound, inactive license and assign it an id.
    ///
    /// Fails with [`StoreError::DuplicateKey`] if the key is taken; nothing
    /// is written in that case.
    async fn create(&self, new: NewLicense) -> Result<License, StoreError>;

    /// Point lookup by key.
    async fn find_by_key(&self, key: &str) -> Result<Option<License>, StoreError>;

    /// Point lookup by id.
    async fn find_by_id(&self, id: LicenseId) -> Result<Option<License>, StoreError>;

    /// Every license, in insertion order.
    async fn list_all(&self) -> Result<Vec<License>, StoreError>;

    /// Atomically apply `mutation` if `precondition` holds on the current
    /// record, returning the record as written.
    ///
    /// Fails with [`StoreError::NotFound`] if the id is unknown and
    /// [`StoreError::Conflict`] if the precondition does not hold.
    async fn compare_and_update(
        &self,
        id: LicenseId,
        precondition: Precondition,
        mutation: Mutation,
    ) -> Result<License, StoreError>;

    /// Human-readable backend name, for logs.
    fn backend_name(&self) -> &str;
}
