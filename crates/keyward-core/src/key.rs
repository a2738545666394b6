//! # License Keys
//!
//! A license key is the bearer credential a customer types into their
//! installation. It is disclosed once, in the issuance response, and must be
//! treated as a secret afterwards.
//!
//! ## Format
//!
//! 16 bytes (128 bits) from the operating system CSPRNG, rendered as
//! uppercase hex in eight dash-separated groups of four:
//!
//! ```text
//! 9F3A-0C41-77B2-E1D8-5A06-B3C9-2F7E-84D1
//! ```
//!
//! At 128 bits the birthday bound for a collision is around 2^64 issued
//! keys; the store still enforces uniqueness and the engine retries on the
//! (practically unreachable) duplicate.
//!
//! Keys loaded from storage are accepted as-is, so keys minted by older
//! deployments in another format keep verifying.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Number of random bytes in a generated key.
const KEY_BYTES: usize = 16;

/// Hex characters per dash-separated group.
const GROUP_LEN: usize = 4;

/// A secret license key.
///
/// `Debug` is redacted to the first group so keys never leak into logs;
/// use [`LicenseKey::as_str`] where the full value is genuinely required
/// (the issuance response, the storage layer).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LicenseKey(String);

impl LicenseKey {
    /// Generate a fresh key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self::from_bytes(&bytes)
    }

    /// Render raw bytes in the grouped-hex key format.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let hex: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
        let grouped = hex
            .as_bytes()
            .chunks(GROUP_LEN)
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect::<Vec<_>>()
            .join("-");
        Self(grouped)
    }

    /// Wrap a key read back from storage.
    pub fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The full key. Only call this where disclosure is intended.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for LicenseKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix: String = self.0.chars().take(GROUP_LEN).collect();
        write!(f, "LicenseKey({prefix}-[REDACTED])")
    }
}

/// Source of fresh license keys.
///
/// Implementations must be `Send + Sync` so the engine can share one
/// generator across request tasks behind an `Arc`.
pub trait KeyGenerator: Send + Sync {
    /// Produce a new key. Uniqueness is enforced by the store, not here.
    fn generate(&self) -> LicenseKey;
}

/// Production generator: 128 bits from the OS CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomKeyGenerator;

impl KeyGenerator for RandomKeyGenerator {
    fn generate(&self) -> LicenseKey {
        LicenseKey::generate()
    }
}
