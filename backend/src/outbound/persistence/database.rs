//! Shared SQLite connection for the persistence adapters.
//!
//! The store is a single embedded file, so one connection guarded by a mutex
//! serialises every unit of work. Diesel's SQLite connection is synchronous;
//! each operation runs on the blocking pool via `spawn_blocking` so the async
//! runtime never waits on disk I/O.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use cap_std::ambient_authority;
use cap_std::fs::Dir;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");
const IN_MEMORY: &str = ":memory:";

/// Errors that can occur while opening or using the database.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DbError {
    /// The database file or its directory could not be opened.
    #[error("failed to open database: {message}")]
    Open { message: String },

    /// Pending migrations could not be applied.
    #[error("failed to migrate database: {message}")]
    Migration { message: String },

    /// The blocking task running a database operation failed.
    #[error("database task failed: {message}")]
    Task { message: String },
}

impl DbError {
    /// Create an open error with the given message.
    pub fn open(message: impl Into<String>) -> Self {
        Self::Open {
            message: message.into(),
        }
    }

    /// Create a migration error with the given message.
    pub fn migration(message: impl Into<String>) -> Self {
        Self::Migration {
            message: message.into(),
        }
    }

    /// Create a task error with the given message.
    pub fn task(message: impl Into<String>) -> Self {
        Self::Task {
            message: message.into(),
        }
    }
}

/// Handle to the migrated SQLite database.
///
/// Cloning is cheap; clones share the same connection.
///
/// # Example
///
/// ```ignore
/// let database = SqliteDatabase::open("data/gallery.sqlite3").await?;
/// let store = DieselPhotoStore::new(database.clone());
/// let regions = DieselMapRegionRepository::new(database);
/// ```
#[derive(Clone)]
pub struct SqliteDatabase {
    conn: Arc<Mutex<SqliteConnection>>,
}

impl SqliteDatabase {
    /// Open the database at `path`, creating parent directories and applying
    /// pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Open`] when the file cannot be opened and
    /// [`DbError::Migration`] when the schema cannot be brought up to date.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, DbError> {
        let path = path.into();
        tokio::task::spawn_blocking(move || Self::open_blocking(&path))
            .await
            .map_err(|error| DbError::task(error.to_string()))?
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Migration`] when the schema cannot be created.
    pub async fn open_in_memory() -> Result<Self, DbError> {
        tokio::task::spawn_blocking(|| Self::connect(IN_MEMORY))
            .await
            .map_err(|error| DbError::task(error.to_string()))?
    }

    fn open_blocking(path: &Path) -> Result<Self, DbError> {
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            Dir::create_ambient_dir_all(parent, ambient_authority()).map_err(|error| {
                DbError::open(format!("create {}: {error}", parent.display()))
            })?;
        }
        let url = path
            .to_str()
            .ok_or_else(|| DbError::open("database path is not valid UTF-8"))?;
        let database = Self::connect(url)?;
        info!(path = %path.display(), "opened photo database");
        Ok(database)
    }

    fn connect(url: &str) -> Result<Self, DbError> {
        let mut conn =
            SqliteConnection::establish(url).map_err(|error| DbError::open(error.to_string()))?;
        diesel::sql_query("PRAGMA foreign_keys = ON")
            .execute(&mut conn)
            .map_err(|error| DbError::open(error.to_string()))?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|error| DbError::migration(error.to_string()))?;
        debug!(applied = applied.len(), "applied pending migrations");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `operation` with exclusive access to the connection on the
    /// blocking pool.
    pub(crate) async fn run<T, F>(&self, operation: F) -> Result<T, DbError>
    where
        F: FnOnce(&mut SqliteConnection) -> T + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| DbError::task("connection lock poisoned"))?;
            Ok(operation(&mut guard))
        })
        .await
        .map_err(|error| DbError::task(error.to_string()))?
    }
}
