//! # keyward-state: License Lifecycle Engine
//!
//! Enforces the license state machine and orchestrates the store.
//!
//! ## States
//!
//! ```text
//!            issue                first verify (CAS)
//! (none) ──────────▶ UNBOUND ───────────────────────▶ ACTIVE
//!                       │                               │
//!                       │ deactivate                    │ deactivate
//!                       ▼                               ▼
//!                  DEACTIVATED ◀────────────────────────┘
//!
//! any state ──(expires_at <= now)──▶ EXPIRED   (computed, never stored)
//! renew moves expires_at forward and changes nothing else
//! ```
//!
//! ## Binding Protocol
//!
//! The first verification of an unbound key claims it for the calling
//! client through a conditional write (`Precondition::Bindable`). A caller
//! that loses the race re-reads the record and is judged against the
//! winner's binding, exactly as if it had arrived a moment later. The
//! conflict never reaches the caller.
//!
//! Binding relies on the store's atomic compare-and-update rather than an
//! in-process lock, so it stays exactly-once when several service
//! instances share one database.

pub mod config;
pub mod engine;
pub mod error;
pub mod lifecycle;

pub use config::{EngineConfig, DEFAULT_MAX_KEY_ATTEMPTS, DEFAULT_RENEWAL_DAYS, MAX_DURATION_DAYS};
pub use engine::{validate_duration, LicenseEngine, Verification};
pub use error::EngineError;
pub use lifecycle::{decide, Decision, LicenseState, RejectReason};
