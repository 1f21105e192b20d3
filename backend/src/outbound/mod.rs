//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **http**: reqwest-backed transport for search calls and image downloads
//! - **persistence**: SQLite-backed pin, photo and map-region storage using
//!   Diesel ORM
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no business logic.

pub mod http;
pub mod persistence;
