//! # Domain Identity Newtypes
//!
//! Newtype wrappers for the identifiers Keyward deals in. They prevent
//! accidental confusion: you cannot pass a [`ClientId`] where a [`Plan`]
//! is expected, nor a raw UUID where a [`LicenseId`] is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Maximum length of a plan name, in characters.
pub const MAX_PLAN_LEN: usize = 50;

/// Maximum length of a client identifier, in characters.
pub const MAX_CLIENT_ID_LEN: usize = 255;

/// Opaque unique identifier of a license record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LicenseId(pub Uuid);

impl LicenseId {
    /// Generate a new random license identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for LicenseId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for LicenseId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for LicenseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "license:{}", self.0)
    }
}

/// Identifier of the client installation a license is bound to.
///
/// Surrounding whitespace is trimmed on construction, so `" host-a"` and
/// `"host-a"` name the same client. Must be non-empty, free of control
/// characters and at most [`MAX_CLIENT_ID_LEN`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClientId(String);

impl ClientId {
    /// Create a validated client identifier.
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyClientId);
        }
        if trimmed.chars().any(char::is_control) {
            return Err(ValidationError::ClientIdControlChar);
        }
        let len = trimmed.chars().count();
        if len > MAX_CLIENT_ID_LEN {
            return Err(ValidationError::ClientIdTooLong {
                max: MAX_CLIENT_ID_LEN,
                actual: len,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Return the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ClientId {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ClientId> for String {
    fn from(id: ClientId) -> Self {
        id.0
    }
}

impl PartialEq<&str> for ClientId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The commercial plan a license was issued under (e.g. `"pro"`).
///
/// Free-form but validated: trimmed, non-empty, no control characters, at
/// most [`MAX_PLAN_LEN`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Plan(String);

impl Plan {
    /// Create a validated plan name.
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyPlan);
        }
        if trimmed.chars().any(char::is_control) {
            return Err(ValidationError::PlanControlChar);
        }
        let len = trimmed.chars().count();
        if len > MAX_PLAN_LEN {
            return Err(ValidationError::PlanTooLong {
                max: MAX_PLAN_LEN,
                actual: len,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Return the plan name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Plan {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Plan> for String {
    fn from(plan: Plan) -> Self {
        plan.0
    }
}

impl PartialEq<&str> for Plan {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
