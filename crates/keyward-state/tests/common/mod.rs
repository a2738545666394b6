//! Shared fixtures for engine tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use keyward_core::{
    ClientId, KeyGenerator, License, LicenseId, LicenseKey, ManualClock, NewLicense, Timestamp,
};
use keyward_state::LicenseEngine;
use keyward_store::{LicenseStore, MemoryLicenseStore, Mutation, Precondition, StoreError};

pub fn t0() -> Timestamp {
    Timestamp::parse("2026-06-01T09:00:00Z").unwrap()
}

/// Engine over a fresh memory store with a manual clock at [`t0`].
pub fn engine() -> (LicenseEngine, ManualClock, MemoryLicenseStore) {
    let store = MemoryLicenseStore::new();
    let clock = ManualClock::new(t0());
    let engine = LicenseEngine::new(Arc::new(store.clone())).with_clock(Arc::new(clock.clone()));
    (engine, clock, store)
}

/// Yields the same key for the first `repeats` calls, then distinct keys.
#[derive(Debug, Default)]
pub struct RepeatingKeys {
    pub repeats: usize,
    calls: AtomicUsize,
}

impl RepeatingKeys {
    pub fn new(repeats: usize) -> Self {
        Self {
            repeats,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl KeyGenerator for RepeatingKeys {
    fn generate(&self) -> LicenseKey {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.repeats {
            LicenseKey::from_bytes(&[0x11; 16])
        } else {
            LicenseKey::from_bytes(&(n as u128).to_be_bytes())
        }
    }
}

/// A store whose every operation fails as if the backend were down.
#[derive(Debug, Default)]
pub struct UnavailableStore;

fn down() -> StoreError {
    StoreError::Backend("connection refused".into())
}

#[async_trait]
impl LicenseStore for UnavailableStore {
    async fn create(&self, _new: NewLicense) -> Result<License, StoreError> {
        Err(down())
    }

    async fn find_by_key(&self, _key: &str) -> Result<Option<License>, StoreError> {
        Err(down())
    }

    async fn find_by_id(&self, _id: LicenseId) -> Result<Option<License>, StoreError> {
        Err(down())
    }

    async fn list_all(&self) -> Result<Vec<License>, StoreError> {
        Err(down())
    }

    async fn compare_and_update(
        &self,
        _id: LicenseId,
        _precondition: Precondition,
        _mutation: Mutation,
    ) -> Result<License, StoreError> {
        Err(down())
    }

    fn backend_name(&self) -> &str {
        "unavailable"
    }
}

/// Wraps a memory store and reports a conflict on every bind without
/// writing, modelling a store that never lets the caller win or settle.
#[derive(Debug, Default)]
pub struct AlwaysConflicting {
    pub inner: MemoryLicenseStore,
}

#[async_trait]
impl LicenseStore for AlwaysConflicting {
    async fn create(&self, new: NewLicense) -> Result<License, StoreError> {
        self.inner.create(new).await
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<License>, StoreError> {
        self.inner.find_by_key(key).await
    }

    async fn find_by_id(&self, id: LicenseId) -> Result<Option<License>, StoreError> {
        self.inner.find_by_id(id).await
    }

    async fn list_all(&self) -> Result<Vec<License>, StoreError> {
        self.inner.list_all().await
    }

    async fn compare_and_update(
        &self,
        id: LicenseId,
        precondition: Precondition,
        mutation: Mutation,
    ) -> Result<License, StoreError> {
        match mutation {
            Mutation::Bind { .. } => Err(StoreError::Conflict(id)),
            other => self.inner.compare_and_update(id, precondition, other).await,
        }
    }

    fn backend_name(&self) -> &str {
        "always-conflicting"
    }
}

/// Wraps a memory store and lets `rival` win every bind: the rival's bind
/// is written first, then the caller's write reports a conflict. This is
/// the interleaving a caller sees when it loses a first-use race.
#[derive(Debug)]
pub struct PreemptedBind {
    pub inner: MemoryLicenseStore,
    pub rival: ClientId,
    preempted: AtomicUsize,
}

impl PreemptedBind {
    pub fn new(rival: &str) -> Self {
        Self {
            inner: MemoryLicenseStore::new(),
            rival: ClientId::new(rival).unwrap(),
            preempted: AtomicUsize::new(0),
        }
    }

    /// Number of binds that were preempted by the rival.
    pub fn preempted(&self) -> usize {
        self.preempted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LicenseStore for PreemptedBind {
    async fn create(&self, new: NewLicense) -> Result<License, StoreError> {
        self.inner.create(new).await
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<License>, StoreError> {
        self.inner.find_by_key(key).await
    }

    async fn find_by_id(&self, id: LicenseId) -> Result<Option<License>, StoreError> {
        self.inner.find_by_id(id).await
    }

    async fn list_all(&self) -> Result<Vec<License>, StoreError> {
        self.inner.list_all().await
    }

    async fn compare_and_update(
        &self,
        id: LicenseId,
        precondition: Precondition,
        mutation: Mutation,
    ) -> Result<License, StoreError> {
        match mutation {
            Mutation::Bind { consumed_at, .. } => {
                let rival = Mutation::Bind {
                    consumer_id: self.rival.clone(),
                    consumed_at,
                };
                self.inner
                    .compare_and_update(id, Precondition::Bindable, rival)
                    .await?;
                self.preempted.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::Conflict(id))
            }
            other => self.inner.compare_and_update(id, precondition, other).await,
        }
    }

    fn backend_name(&self) -> &str {
        "preempted-bind"
    }
}
