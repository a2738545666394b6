//! # keyward-store: License Store
//!
//! Durable storage of [`License`](keyward_core::License) records with atomic
//! conditional mutation. The lifecycle engine talks to storage only through
//! the [`LicenseStore`] trait; this crate ships the in-memory backend and
//! `keyward-api` ships the Postgres one.
//!
//! ## Conditional Writes
//!
//! Every mutation goes through [`LicenseStore::compare_and_update`], which
//! pairs a [`Precondition`] with a [`Mutation`] and applies both as one
//! atomic step. The write-once binding of a license to its first client is
//! a `Precondition::Bindable` + `Mutation::Bind` pair: of any number of
//! concurrent attempts, exactly one sees its precondition hold.
//!
//! The guarantee lives in the store, not in an application lock, so it
//! holds across several service instances sharing one backend.

pub mod error;
pub mod memory;
pub mod store;
pub mod write;

pub use error::StoreError;
pub use memory::MemoryLicenseStore;
pub use store::LicenseStore;
pub use write::{Mutation, Precondition};
