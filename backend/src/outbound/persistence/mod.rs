//! SQLite persistence adapters using Diesel ORM.
//!
//! This module provides concrete implementations of the domain's store ports
//! backed by one embedded SQLite file.
//!
//! # Architecture
//!
//! - **Thin adapters**: repository implementations only translate between
//!   Diesel models and domain types.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) never leave this module.
//! - **Blocking isolation**: the synchronous SQLite connection is only
//!   touched from `spawn_blocking` tasks.
//! - **Embedded migrations**: the schema is applied when the database opens.
//!
//! # Example
//!
//! ```ignore
//! use pin_gallery::outbound::persistence::{DieselPhotoStore, SqliteDatabase};
//!
//! let database = SqliteDatabase::open("gallery.sqlite3").await?;
//! let store = DieselPhotoStore::new(database);
//! ```

mod database;
pub(crate) mod diesel_helpers;
mod diesel_map_region_repository;
mod diesel_photo_store;
mod models;
mod schema;

pub use database::{DbError, SqliteDatabase};
pub use diesel_map_region_repository::DieselMapRegionRepository;
pub use diesel_photo_store::DieselPhotoStore;
