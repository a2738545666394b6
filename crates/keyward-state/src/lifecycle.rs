//! # License Lifecycle
//!
//! The lifecycle state of a license is derived from its record and the
//! current time; nothing here is stored. [`decide`] is the pure decision
//! table behind verification: the engine feeds it a fresh read and acts on
//! the answer.

use std::fmt;

use keyward_core::{ClientId, License, Timestamp};
use serde::{Deserialize, Serialize};

/// The lifecycle state of a license at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LicenseState {
    /// Issued, never verified.
    Unbound,
    /// Bound to a client and usable by that client.
    Active,
    /// Turned off by an administrator.
    Deactivated,
    /// `expires_at` has passed. Takes precedence over every other state.
    Expired,
}

impl LicenseState {
    /// Derive the state of `license` as of `now`.
    pub fn of(license: &License, now: Timestamp) -> Self {
        if license.is_expired_at(now) {
            Self::Expired
        } else if license.is_deactivated() {
            Self::Deactivated
        } else if license.is_bound() {
            Self::Active
        } else {
            Self::Unbound
        }
    }
}

impl fmt::Display for LicenseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unbound => "UNBOUND",
            Self::Active => "ACTIVE",
            Self::Deactivated => "DEACTIVATED",
            Self::Expired => "EXPIRED",
        };
        f.write_str(s)
    }
}

// ─── Verification Outcomes ──────────────────────────────────────────

/// Why a verification was refused. These are normal outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    #[serde(rename = "not found")]
    NotFound,
    #[serde(rename = "expired")]
    Expired,
    #[serde(rename = "inactive")]
    Inactive,
    #[serde(rename = "bound_to_another_client")]
    BoundToAnotherClient,
}

impl RejectReason {
    /// The wire string for this reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not found",
            Self::Expired => "expired",
            Self::Inactive => "inactive",
            Self::BoundToAnotherClient => "bound_to_another_client",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What verification should do with a record it has just read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Refuse with the given reason.
    Reject(RejectReason),
    /// The key is unclaimed: attempt the conditional bind.
    Bind,
    /// The key already belongs to the caller.
    Accept,
}

/// Decide the verification outcome for `client` presenting `license` at
/// `now`.
///
/// Checks run in a fixed order: expiry, deactivation, then binding. An
/// expired key is reported as expired even to its own consumer.
pub fn decide(license: &License, client: &ClientId, now: Timestamp) -> Decision {
    match LicenseState::of(license, now) {
        LicenseState::Expired => Decision::Reject(RejectReason::Expired),
        LicenseState::Deactivated => Decision::Reject(RejectReason::Inactive),
        LicenseState::Unbound => Decision::Bind,
        LicenseState::Active if license.is_bound_to(client) => Decision::Accept,
        LicenseState::Active => Decision::Reject(RejectReason::BoundToAnotherClient),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use keyward_core::{LicenseId, LicenseKey, NewLicense, Plan};

    fn t0() -> Timestamp {
        Timestamp::parse("2026-03-01T00:00:00Z").unwrap()
    }

    fn license() -> License {
        License::issued(
            LicenseId::new(),
            NewLicense {
                key: LicenseKey::from_bytes(&[0xAB; 16]),
                plan: Plan::new("pro").unwrap(),
                created_at: t0(),
                expires_at: t0().checked_add(Duration::days(10)).unwrap(),
            },
        )
    }

    fn client(s: &str) -> ClientId {
        ClientId::new(s).unwrap()
    }

    fn bound_to(s: &str) -> License {
        let mut lic = license();
        lic.consumer_id = Some(client(s));
        lic.consumed_at = Some(t0());
        lic.is_active = true;
        lic
    }

    #[test]
    fn fresh_license_binds() {
        assert_eq!(decide(&license(), &client("a"), t0()), Decision::Bind);
        assert_eq!(LicenseState::of(&license(), t0()), LicenseState::Unbound);
    }

    #[test]
    fn owner_is_accepted_and_others_rejected() {
        let lic = bound_to("a");
        assert_eq!(decide(&lic, &client("a"), t0()), Decision::Accept);
        assert_eq!(
            decide(&lic, &client("b"), t0()),
            Decision::Reject(RejectReason::BoundToAnotherClient)
        );
    }

    #[test]
    fn expiry_wins_over_everything() {
        let at_expiry = t0().checked_add(Duration::days(10)).unwrap();
        for lic in [license(), bound_to("a")] {
            assert_eq!(
                decide(&lic, &client("a"), at_expiry),
                Decision::Reject(RejectReason::Expired)
            );
        }
        let mut dead = bound_to("a");
        dead.is_active = false;
        dead.deactivated_at = Some(t0());
        assert_eq!(LicenseState::of(&dead, at_expiry), LicenseState::Expired);
    }

    #[test]
    fn deactivated_is_inactive_for_owner_and_strangers() {
        let mut lic = bound_to("a");
        lic.is_active = false;
        lic.deactivated_at = Some(t0());
        for who in ["a", "b"] {
            assert_eq!(
                decide(&lic, &client(who), t0()),
                Decision::Reject(RejectReason::Inactive)
            );
        }

        let mut never_bound = license();
        never_bound.deactivated_at = Some(t0());
        assert_eq!(
            decide(&never_bound, &client("a"), t0()),
            Decision::Reject(RejectReason::Inactive)
        );
    }

    #[test]
    fn state_display_and_serde_agree() {
        for state in [
            LicenseState::Unbound,
            LicenseState::Active,
            LicenseState::Deactivated,
            LicenseState::Expired,
        ] {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{state}\""));
        }
    }

    #[test]
    fn reason_wire_strings() {
        assert_eq!(RejectReason::NotFound.to_string(), "not found");
        assert_eq!(
            serde_json::to_string(&RejectReason::BoundToAnotherClient).unwrap(),
            "\"bound_to_another_client\""
        );
        assert_eq!(
            serde_json::from_str::<RejectReason>("\"not found\"").unwrap(),
            RejectReason::NotFound
        );
    }
}
