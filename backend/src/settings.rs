//! Runtime configuration loaded via OrthoConfig.
//!
//! Values come from `PIN_GALLERY_*` environment variables or a
//! configuration file; anything left unset falls back to the defaults below.

use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::photo_search::{DEFAULT_ENDPOINT, PhotoSearchConfig};

const DEFAULT_DATABASE_FILE: &str = "pin-gallery.sqlite3";
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 15;
const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 4;

/// Errors raised while turning settings into runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// No API key was configured.
    #[error("PIN_GALLERY_API_KEY must be set to search for photos")]
    MissingApiKey,
    /// The endpoint override is not a URL.
    #[error("invalid search endpoint {endpoint:?}: {message}")]
    InvalidEndpoint { endpoint: String, message: String },
}

/// Configuration values for the gallery binary.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PIN_GALLERY")]
pub struct GallerySettings {
    /// Photo search API key.
    pub api_key: Option<String>,
    /// Search endpoint override.
    pub endpoint: Option<String>,
    /// SQLite database file.
    pub database_path: Option<PathBuf>,
    /// Per-request timeout in seconds.
    pub request_timeout_seconds: Option<u64>,
    /// Concurrent network call limit.
    pub max_concurrent_requests: Option<usize>,
    /// Emit JSON log lines instead of human-readable ones.
    #[ortho_config(default = false)]
    pub log_json: bool,
}

impl GallerySettings {
    /// Configured database path, falling back to a file in the working
    /// directory.
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_FILE))
    }

    /// Per-request timeout; zero is raised to one second.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_seconds
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECONDS)
                .max(1),
        )
    }

    /// Concurrent network call limit, never below one.
    pub fn max_concurrent_requests(&self) -> usize {
        self.max_concurrent_requests
            .unwrap_or(DEFAULT_MAX_CONCURRENT_REQUESTS)
            .max(1)
    }

    /// Search endpoint, falling back to the public API.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidEndpoint`] when the override does not
    /// parse.
    pub fn endpoint(&self) -> Result<Url, SettingsError> {
        let raw = self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
        Url::parse(raw).map_err(|error| SettingsError::InvalidEndpoint {
            endpoint: raw.to_owned(),
            message: error.to_string(),
        })
    }

    /// Pipeline configuration built from these settings.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::MissingApiKey`] when no non-blank key is set,
    /// or an endpoint error.
    pub fn photo_search_config(&self) -> Result<PhotoSearchConfig, SettingsError> {
        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(SettingsError::MissingApiKey)?;
        let mut config = PhotoSearchConfig::new(self.endpoint()?, api_key);
        config.max_concurrent_requests = self.max_concurrent_requests();
        Ok(config)
    }
}
