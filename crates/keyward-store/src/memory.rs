//! # In-Memory License Store
//!
//! Thread-safe, cloneable store for development, tests, and single-node
//! deployments without a database.
//!
//! All state sits behind one `parking_lot::RwLock`. Every operation takes
//! the lock once, does its work synchronously and releases it before
//! returning, so no lock is ever held across an `.await`. `parking_lot`
//! locks do not poison: a panicking writer does not brick the store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use keyward_core::{License, LicenseId, NewLicense};
use parking_lot::RwLock;

use crate::error::StoreError;
use crate::store::LicenseStore;
use crate::write::{Mutation, Precondition};

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<LicenseId, License>,
    by_key: HashMap<String, LicenseId>,
    order: Vec<LicenseId>,
}

/// In-memory [`LicenseStore`]. Clones share the same underlying data.
#[derive(Debug, Clone, Default)]
pub struct MemoryLicenseStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryLicenseStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored licenses.
    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LicenseStore for MemoryLicenseStore {
    async fn create(&self, new: NewLicense) -> Result<License, StoreError> {
        let mut guard = self.inner.write();
        if guard.by_key.contains_key(new.key.as_str()) {
            return Err(StoreError::DuplicateKey);
        }
        let id = LicenseId::new();
        let license = License::issued(id, new);
        guard.by_key.insert(license.key.as_str().to_string(), id);
        guard.order.push(id);
        guard.records.insert(id, license.clone());
        Ok(license)
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<License>, StoreError> {
        let guard = self.inner.read();
        Ok(guard
            .by_key
            .get(key)
            .and_then(|id| guard.records.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: LicenseId) -> Result<Option<License>, StoreError> {
        Ok(self.inner.read().records.get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<License>, StoreError> {
        let guard = self.inner.read();
        Ok(guard
            .order
            .iter()
            .filter_map(|id| guard.records.get(id))
            .cloned()
            .collect())
    }

    async fn compare_and_update(
        &self,
        id: LicenseId,
        precondition: Precondition,
        mutation: Mutation,
    ) -> Result<License, StoreError> {
        let mut guard = self.inner.write();
        let current = guard.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if !precondition.holds(current) {
            tracing::debug!(license_id = %id, mutation = mutation.name(), "precondition failed");
            return Err(StoreError::Conflict(id));
        }
        // Apply to a copy so a rejected mutation leaves the record untouched.
        let mut next = current.clone();
        mutation.apply(&mut next)?;
        *current = next.clone();
        Ok(next)
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use keyward_core::{ClientId, LicenseKey, Plan, Timestamp};

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn new_license(key: &str) -> NewLicense {
        NewLicense {
            key: LicenseKey::from_stored(key),
            plan: Plan::new("pro").unwrap(),
            created_at: ts("2026-01-01T00:00:00Z"),
            expires_at: ts("2026-01-31T00:00:00Z"),
        }
    }

    fn bind(client: &str) -> Mutation {
        Mutation::Bind {
            consumer_id: ClientId::new(client).unwrap(),
            consumed_at: ts("2026-01-02T00:00:00Z"),
        }
    }

    #[tokio::test]
    async fn create_then_lookup() {
        let store = MemoryLicenseStore::new();
        let lic = store.create(new_license("K-1")).await.unwrap();
        assert!(!lic.is_active);
        assert!(lic.consumer_id.is_none());

        let by_key = store.find_by_key("K-1").await.unwrap().unwrap();
        let by_id = store.find_by_id(lic.id).await.unwrap().unwrap();
        assert_eq!(by_key, lic);
        assert_eq!(by_id, lic);
    }

    #[tokio::test]
    async fn missing_lookups_are_none() {
        let store = MemoryLicenseStore::new();
        assert!(store.find_by_key("nope").await.unwrap().is_none());
        assert!(store.find_by_id(LicenseId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_key_is_rejected_without_writing() {
        let store = MemoryLicenseStore::new();
        store.create(new_license("K-1")).await.unwrap();
        let err = store.create(new_license("K-1")).await.unwrap_err();
        assert_eq!(err, StoreError::DuplicateKey);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn list_preserves_insertion_order() {
        let store = MemoryLicenseStore::new();
        let keys = ["K-3", "K-1", "K-2"];
        for k in keys {
            store.create(new_license(k)).await.unwrap();
        }
        let listed: Vec<String> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.key.as_str().to_string())
            .collect();
        assert_eq!(listed, keys);
    }

    #[tokio::test]
    async fn bindable_cas_succeeds_once() {
        let store = MemoryLicenseStore::new();
        let lic = store.create(new_license("K-1")).await.unwrap();

        let won = store
            .compare_and_update(lic.id, Precondition::Bindable, bind("a"))
            .await
            .unwrap();
        assert_eq!(won.consumer_id.as_ref().unwrap(), &"a");

        let lost = store
            .compare_and_update(lic.id, Precondition::Bindable, bind("b"))
            .await
            .unwrap_err();
        assert_eq!(lost, StoreError::Conflict(lic.id));

        let stored = store.find_by_id(lic.id).await.unwrap().unwrap();
        assert_eq!(stored.consumer_id.as_ref().unwrap(), &"a");
    }

    #[tokio::test]
    async fn unconditional_bind_still_write_once() {
        let store = MemoryLicenseStore::new();
        let lic = store.create(new_license("K-1")).await.unwrap();
        store
            .compare_and_update(lic.id, Precondition::Always, bind("a"))
            .await
            .unwrap();
        let err = store
            .compare_and_update(lic.id, Precondition::Always, bind("b"))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Conflict(lic.id));
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let store = MemoryLicenseStore::new();
        let id = LicenseId::new();
        let err = store
            .compare_and_update(id, Precondition::Always, Mutation::Deactivate { at: Timestamp::now() })
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound(id));
    }

    #[tokio::test]
    async fn rejected_mutation_leaves_record_untouched() {
        let store = MemoryLicenseStore::new();
        let lic = store.create(new_license("K-1")).await.unwrap();
        let err = store
            .compare_and_update(
                lic.id,
                Precondition::Always,
                Mutation::ExtendExpiry { by: Duration::MAX },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
        assert_eq!(store.find_by_id(lic.id).await.unwrap().unwrap(), lic);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = MemoryLicenseStore::new();
        let other = store.clone();
        store.create(new_license("K-1")).await.unwrap();
        assert_eq!(other.len(), 1);
        assert!(!other.is_empty());
    }
}
