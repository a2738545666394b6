//! Engine tunables.

use chrono::Duration;

/// Days added to `expires_at` by a renewal unless configured otherwise.
pub const DEFAULT_RENEWAL_DAYS: i64 = 30;

/// Key generations attempted per issuance before giving up on collisions.
pub const DEFAULT_MAX_KEY_ATTEMPTS: u32 = 5;

/// Longest license term accepted at issuance (roughly a century).
pub const MAX_DURATION_DAYS: i64 = 36_500;

/// Configuration of a [`LicenseEngine`](crate::LicenseEngine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Days each renewal adds to `expires_at`.
    pub renewal_extension_days: i64,
    /// Key generations attempted per issuance; at least one.
    pub max_key_attempts: u32,
}

impl EngineConfig {
    /// The renewal extension as a duration.
    pub fn renewal_extension(&self) -> Duration {
        Duration::days(self.renewal_extension_days)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            renewal_extension_days: DEFAULT_RENEWAL_DAYS,
            max_key_attempts: DEFAULT_MAX_KEY_ATTEMPTS,
        }
    }
}
