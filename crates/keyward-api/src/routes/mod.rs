//! # API Route Modules
//!
//! - `licenses`: issuance, verification (first-use binding) and the admin
//!   lifecycle operations.

pub mod licenses;
