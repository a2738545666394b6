//! # License Engine
//!
//! [`LicenseEngine`] owns the lifecycle rules and talks to a
//! [`LicenseStore`] through conditional writes only. Every state change is
//! a single `compare_and_update`, so the engine holds no locks of its own
//! and can be cloned freely across request handlers.

use std::fmt;
use std::sync::Arc;

use chrono::Duration;
use keyward_core::{
    ClientId, Clock, KeyGenerator, License, LicenseId, NewLicense, Plan, RandomKeyGenerator,
    SystemClock, Timestamp, ValidationError,
};
use keyward_store::{LicenseStore, Mutation, Precondition, StoreError};

use crate::config::{EngineConfig, MAX_DURATION_DAYS};
use crate::error::EngineError;
use crate::lifecycle::{decide, Decision, RejectReason};

/// Rounds of read-decide-CAS a single verification may take. One lost race
/// is enough to settle the key (the winner has bound it), so the bound is
/// only reached if the store misbehaves.
const MAX_BIND_ATTEMPTS: usize = 3;

/// Result of presenting a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// First use: this call bound the key to the caller.
    Bound(License),
    /// The key was already bound to the caller.
    Recognized(License),
    /// The key cannot be used by the caller.
    Rejected(RejectReason),
}

impl Verification {
    /// Whether the caller may use the key.
    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }

    /// The license record, present only on success.
    pub fn license(&self) -> Option<&License> {
        match self {
            Self::Bound(l) | Self::Recognized(l) => Some(l),
            Self::Rejected(_) => None,
        }
    }

    /// The refusal reason, present only on failure.
    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            Self::Rejected(r) => Some(*r),
            _ => None,
        }
    }

    /// Label for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Bound(_) => "bound",
            Self::Recognized(_) => "recognized",
            Self::Rejected(RejectReason::NotFound) => "not_found",
            Self::Rejected(RejectReason::Expired) => "expired",
            Self::Rejected(RejectReason::Inactive) => "inactive",
            Self::Rejected(RejectReason::BoundToAnotherClient) => "bound_to_another_client",
        }
    }
}

/// The license lifecycle engine.
#[derive(Clone)]
pub struct LicenseEngine {
    store: Arc<dyn LicenseStore>,
    clock: Arc<dyn Clock>,
    keys: Arc<dyn KeyGenerator>,
    config: EngineConfig,
}

impl fmt::Debug for LicenseEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LicenseEngine")
            .field("store", &self.store.backend_name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LicenseEngine {
    /// Engine over `store` with the system clock, random keys and default
    /// configuration.
    pub fn new(store: Arc<dyn LicenseStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            keys: Arc::new(RandomKeyGenerator),
            config: EngineConfig::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_key_generator(mut self, keys: Arc<dyn KeyGenerator>) -> Self {
        self.keys = keys;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current time according to the engine's clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Name of the backing store, for health reporting.
    pub fn backend_name(&self) -> &str {
        self.store.backend_name()
    }

    // ─── Issuance ───────────────────────────────────────────────────

    /// Issue a new, unbound license valid for `duration_days` from now.
    ///
    /// A key collision is retried with a freshly generated key up to
    /// `max_key_attempts` times in total.
    pub async fn issue(&self, plan: &str, duration_days: i64) -> Result<License, EngineError> {
        let plan = Plan::new(plan)?;
        validate_duration(duration_days)?;

        let created_at = self.clock.now();
        let expires_at = created_at.checked_add(Duration::days(duration_days))?;

        for attempt in 1..=self.config.max_key_attempts {
            let new = NewLicense {
                key: self.keys.generate(),
                plan: plan.clone(),
                created_at,
                expires_at,
            };
            match self.store.create(new).await {
                Ok(license) => {
                    tracing::info!(
                        license_id = %license.id,
                        plan = %license.plan,
                        expires_at = %license.expires_at,
                        "license issued"
                    );
                    return Ok(license);
                }
                Err(StoreError::DuplicateKey) => {
                    tracing::warn!(attempt, "generated license key collided; regenerating");
                }
                Err(err) => return Err(err.into()),
            }
        }

        tracing::error!(
            attempts = self.config.max_key_attempts,
            "license key generation kept colliding"
        );
        Err(EngineError::Storage(format!(
            "key generation collided {} times",
            self.config.max_key_attempts
        )))
    }

    // ─── Verification ───────────────────────────────────────────────

    /// Present `key` on behalf of `client_id`.
    ///
    /// The first successful call for a key binds it to the caller; from then
    /// on only that client is accepted. Concurrent first calls from
    /// different clients produce exactly one binder, and every loser sees
    /// `bound_to_another_client` (or success, if it is the same client).
    pub async fn verify(&self, key: &str, client_id: &str) -> Result<Verification, EngineError> {
        let client = ClientId::new(client_id)?;

        // Issued keys never contain control characters, and some backends
        // refuse NUL in text parameters outright.
        if key.chars().any(char::is_control) {
            tracing::debug!("verification for malformed key");
            return Ok(Verification::Rejected(RejectReason::NotFound));
        }

        let Some(mut license) = self.store.find_by_key(key).await? else {
            tracing::debug!("verification for unknown key");
            return Ok(Verification::Rejected(RejectReason::NotFound));
        };

        for _ in 0..MAX_BIND_ATTEMPTS {
            let now = self.clock.now();
            match decide(&license, &client, now) {
                Decision::Reject(reason) => {
                    tracing::debug!(license_id = %license.id, %reason, "verification rejected");
                    return Ok(Verification::Rejected(reason));
                }
                Decision::Accept => return Ok(Verification::Recognized(license)),
                Decision::Bind => {
                    let bind = Mutation::Bind {
                        consumer_id: client.clone(),
                        consumed_at: now,
                    };
                    match self
                        .store
                        .compare_and_update(license.id, Precondition::Bindable, bind)
                        .await
                    {
                        Ok(bound) => {
                            tracing::info!(license_id = %bound.id, client_id = %client, "license bound");
                            return Ok(Verification::Bound(bound));
                        }
                        Err(StoreError::Conflict(id)) => {
                            tracing::debug!(license_id = %id, "lost binding race; re-reading");
                            match self.store.find_by_id(id).await? {
                                Some(current) => license = current,
                                None => return Ok(Verification::Rejected(RejectReason::NotFound)),
                            }
                        }
                        Err(err) => return Err(err.into()),
                    }
                }
            }
        }

        tracing::error!(license_id = %license.id, "binding did not settle");
        Err(EngineError::Storage(format!(
            "binding of {} did not settle after {MAX_BIND_ATTEMPTS} attempts",
            license.id
        )))
    }

    // ─── Administration ─────────────────────────────────────────────

    pub async fn get(&self, id: LicenseId) -> Result<License, EngineError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(EngineError::NotFound(id))
    }

    /// All licenses in insertion order.
    pub async fn list(&self) -> Result<Vec<License>, EngineError> {
        Ok(self.store.list_all().await?)
    }

    /// Turn a license off. Idempotent: the binding and the first
    /// `deactivated_at` stamp are kept.
    pub async fn deactivate(&self, id: LicenseId) -> Result<License, EngineError> {
        let at = self.clock.now();
        let license = self
            .store
            .compare_and_update(id, Precondition::Always, Mutation::Deactivate { at })
            .await?;
        tracing::info!(license_id = %id, "license deactivated");
        Ok(license)
    }

    /// Push `expires_at` forward by the configured renewal extension.
    ///
    /// The extension is applied to the stored value inside the write, so
    /// concurrent renewals add up. Renewal does not reactivate a
    /// deactivated license.
    pub async fn renew(&self, id: LicenseId) -> Result<License, EngineError> {
        let by = self.config.renewal_extension();
        let license = self
            .store
            .compare_and_update(id, Precondition::Always, Mutation::ExtendExpiry { by })
            .await?;
        tracing::info!(license_id = %id, expires_at = %license.expires_at, "license renewed");
        Ok(license)
    }
}

/// Check that a license duration is positive and within
/// [`MAX_DURATION_DAYS`].
pub fn validate_duration(days: i64) -> Result<(), ValidationError> {
    if days <= 0 {
        return Err(ValidationError::NonPositiveDuration(days));
    }
    if days > MAX_DURATION_DAYS {
        return Err(ValidationError::DurationTooLong {
            max: MAX_DURATION_DAYS,
            actual: days,
        });
    }
    Ok(())
}
