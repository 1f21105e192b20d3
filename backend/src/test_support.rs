//! Test utilities for the pin gallery crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled for tests or with the
//! `test-support` feature.

pub mod memory_store;
pub mod scripted_transport;

pub use memory_store::{InMemoryMapRegionRepository, InMemoryPhotoStore};
pub use scripted_transport::ScriptedTransport;

use crate::outbound::persistence::{DbError, SqliteDatabase};

/// Search response body with `pages` total pages and no photos.
pub fn page_count_body(pages: i64) -> String {
    format!(r#"{{"photos":{{"page":1,"pages":{pages},"perpage":21,"photo":[]}},"stat":"ok"}}"#)
}

/// Search response body listing `urls` as medium-size photo URLs.
pub fn photo_page_body(urls: &[&str]) -> String {
    let entries = urls
        .iter()
        .enumerate()
        .map(|(index, url)| format!(r#"{{"id":"{index}","url_m":"{url}"}}"#))
        .collect::<Vec<_>>()
        .join(",");
    format!(r#"{{"photos":{{"page":1,"pages":1,"photo":[{entries}]}},"stat":"ok"}}"#)
}

/// On-disk SQLite database in a temporary directory.
///
/// Keep the returned directory alive for as long as the database is used.
///
/// # Errors
///
/// Returns an error when the directory or database cannot be created.
pub async fn temp_database() -> Result<(tempfile::TempDir, SqliteDatabase), DbError> {
    let directory = tempfile::tempdir().map_err(|error| DbError::open(error.to_string()))?;
    let database = SqliteDatabase::open(directory.path().join("gallery.sqlite3")).await?;
    Ok((directory, database))
}
