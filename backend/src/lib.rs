//! Pin gallery library modules.
//!
//! The domain owns the photo-collection pipeline and the ports it needs;
//! `outbound` provides the reqwest transport and the Diesel/SQLite store;
//! `settings` loads runtime configuration.

pub mod domain;
pub mod outbound;
pub mod settings;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
