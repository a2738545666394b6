//! # keyward-core: Foundational Types for Keyward
//!
//! Leaf crate of the Keyward workspace. It defines the vocabulary every
//! other crate speaks: license identifiers, the secret license key, UTC
//! timestamps, the clock abstraction, and the [`License`] record itself.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `LicenseId`, `ClientId`,
//!    `Plan` and `LicenseKey` are distinct types with validated constructors.
//!    A client identifier cannot be passed where a plan is expected.
//!
//! 2. **Keys are secrets.** [`LicenseKey`] is generated from the OS CSPRNG
//!    and its `Debug` output is redacted, so a stray `{:?}` in a log line
//!    never discloses a credential.
//!
//! 3. **UTC-only, seconds-precision timestamps.** [`Timestamp`] truncates
//!    sub-seconds so records round-trip through any backend unchanged.
//!
//! 4. **Time is injected.** Expiry is evaluated against a [`Clock`], never
//!    against a stored flag.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `keyward-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod key;
pub mod license;
pub mod temporal;

pub use error::ValidationError;
pub use identity::{ClientId, LicenseId, Plan, MAX_CLIENT_ID_LEN, MAX_PLAN_LEN};
pub use key::{KeyGenerator, LicenseKey, RandomKeyGenerator};
pub use license::{License, NewLicense};
pub use temporal::{Clock, ManualClock, SystemClock, Timestamp};
