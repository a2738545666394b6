//! # The License Record
//!
//! [`License`] is the only entity Keyward persists. Field-level rules:
//!
//! | Field | Rule |
//! |---|---|
//! | `id`, `key`, `plan`, `created_at` | immutable after creation |
//! | `expires_at` | moves forward only, via renewal |
//! | `consumer_id`, `consumed_at` | write-once, set together on first binding |
//! | `deactivated_at` | set once, by the first deactivation |
//! | `is_active` | true iff bound and not deactivated |
//!
//! Expiry is never stored; callers ask [`License::is_expired_at`] with the
//! current time.

use serde::{Deserialize, Serialize};

use crate::identity::{ClientId, LicenseId, Plan};
use crate::key::LicenseKey;
use crate::temporal::Timestamp;

/// A license record as held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub id: LicenseId,
    pub key: LicenseKey,
    pub plan: Plan,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub is_active: bool,
    pub consumer_id: Option<ClientId>,
    pub consumed_at: Option<Timestamp>,
    pub deactivated_at: Option<Timestamp>,
}

impl License {
    /// Build the initial record for a freshly issued key: unbound, inactive.
    pub fn issued(id: LicenseId, new: NewLicense) -> Self {
        Self {
            id,
            key: new.key,
            plan: new.plan,
            created_at: new.created_at,
            expires_at: new.expires_at,
            is_active: false,
            consumer_id: None,
            consumed_at: None,
            deactivated_at: None,
        }
    }

    /// Whether a client has claimed this key.
    pub fn is_bound(&self) -> bool {
        self.consumer_id.is_some()
    }

    /// Whether the key is claimed by exactly this client.
    pub fn is_bound_to(&self, client: &ClientId) -> bool {
        self.consumer_id.as_ref() == Some(client)
    }

    /// Whether an administrator has deactivated the key.
    pub fn is_deactivated(&self) -> bool {
        self.deactivated_at.is_some()
    }

    /// Whether the key has expired as of `now`. The boundary instant counts
    /// as expired.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at <= now
    }

    /// Whether a first verification may still claim the key.
    pub fn is_bindable(&self) -> bool {
        !self.is_bound() && !self.is_deactivated()
    }
}

/// Everything the store needs to insert a new license.
///
/// The store assigns the [`LicenseId`]; the key is generated by the caller
/// so that a collision can be retried with a fresh one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLicense {
    pub key: LicenseKey,
    pub plan: Plan,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample() -> License {
        let now = Timestamp::parse("2026-01-15T12:00:00Z").unwrap();
        License::issued(
            LicenseId::new(),
            NewLicense {
                key: LicenseKey::from_bytes(&[1, 2, 3, 4]),
                plan: Plan::new("pro").unwrap(),
                created_at: now,
                expires_at: now.checked_add(Duration::days(30)).unwrap(),
            },
        )
    }

    #[test]
    fn issued_license_is_unbound_and_inactive() {
        let lic = sample();
        assert!(!lic.is_active);
        assert!(!lic.is_bound());
        assert!(!lic.is_deactivated());
        assert!(lic.is_bindable());
        assert!(lic.consumed_at.is_none());
    }

    #[test]
    fn expiry_boundary_counts_as_expired() {
        let lic = sample();
        let before = lic.expires_at.checked_add(Duration::seconds(-1)).unwrap();
        assert!(!lic.is_expired_at(before));
        assert!(lic.is_expired_at(lic.expires_at));
    }

    #[test]
    fn bound_to_compares_client() {
        let mut lic = sample();
        let a = ClientId::new("a").unwrap();
        let b = ClientId::new("b").unwrap();
        lic.consumer_id = Some(a.clone());
        assert!(lic.is_bound_to(&a));
        assert!(!lic.is_bound_to(&b));
        assert!(!lic.is_bindable());
    }

    #[test]
    fn debug_does_not_leak_key() {
        let lic = sample();
        assert!(!format!("{lic:?}").contains("0102-0304"));
    }

    #[test]
    fn serde_roundtrip_preserves_record() {
        let lic = sample();
        let json = serde_json::to_string(&lic).unwrap();
        assert!(json.contains("\"key\":\"0102-0304\""));
        let back: License = serde_json::from_str(&json).unwrap();
        assert_eq!(back, lic);
    }
}
