//! Driven port for the local pin and photo record store.
//!
//! Every mutating method is one unit of work: the adapter opens a write
//! transaction, applies all changes, commits, and only then publishes a
//! [`StoreChange`]. Reads may lag behind in-flight writes.

use std::fmt;

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::define_port_error;
use crate::domain::geo::Coordinate;

/// Store-assigned handle of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationId(pub i64);

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Store-assigned handle of a photo record.
///
/// Handles identify rows for deletion only; the logical key of a photo is
/// its source URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhotoId(pub i64);

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user-placed pin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    /// Store handle.
    pub id: LocationId,
    /// Where the pin was dropped.
    pub coordinate: Coordinate,
}

/// A remote photo attached to one pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    /// Store handle.
    pub id: PhotoId,
    /// Owning pin; never reassigned.
    pub location_id: LocationId,
    /// Source URL of the medium-size image.
    pub url: String,
    /// Image bytes, absent until the deferred fetch lands.
    pub image: Option<Vec<u8>>,
}

impl Photo {
    /// Whether the image bytes have been stored.
    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

/// Notification published after a write commits.
///
/// Writes that change no records publish nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    /// A pin was created.
    LocationCreated(LocationId),
    /// A pin and its photos were deleted.
    LocationDeleted(LocationId),
    /// Photo records were created for a pin.
    PhotosCreated {
        /// Owning pin.
        location_id: LocationId,
        /// Number of records created.
        count: usize,
    },
    /// Photo records were deleted.
    PhotosDeleted {
        /// Number of records deleted.
        count: usize,
    },
    /// Image bytes were written to every record sharing a URL.
    PayloadStored {
        /// Source URL that was resolved at write time.
        url: String,
        /// Number of records updated.
        count: usize,
    },
}

define_port_error! {
    /// Errors raised by photo store adapters.
    pub enum PhotoStoreError {
        /// The store could not be reached or opened.
        Connection { message: String } =>
            "photo store connection failed: {message}",
        /// A query or write failed.
        Query { message: String } =>
            "photo store query failed: {message}",
        /// A write referenced a pin that no longer exists.
        MissingLocation { location_id: i64 } =>
            "pin {location_id} does not exist",
    }
}

/// Port for pin and photo persistence.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Create a pin at `coordinate`.
    async fn create_location(&self, coordinate: Coordinate) -> Result<Location, PhotoStoreError>;

    /// Look up one pin.
    async fn location(&self, id: LocationId) -> Result<Option<Location>, PhotoStoreError>;

    /// All pins in creation order.
    async fn locations(&self) -> Result<Vec<Location>, PhotoStoreError>;

    /// Delete a pin and its photos. Returns whether the pin existed.
    async fn delete_location(&self, id: LocationId) -> Result<bool, PhotoStoreError>;

    /// Create one photo per URL for `location`, payload absent, in one write.
    ///
    /// Either every record is created or none is.
    async fn create_photos(
        &self,
        location: LocationId,
        urls: &[String],
    ) -> Result<Vec<Photo>, PhotoStoreError>;

    /// Photos owned by `location` in creation order.
    async fn photos_for_location(&self, location: LocationId)
    -> Result<Vec<Photo>, PhotoStoreError>;

    /// Every photo whose URL equals `url`, across all pins.
    async fn photos_with_url(&self, url: &str) -> Result<Vec<Photo>, PhotoStoreError>;

    /// Delete the given photos. Unknown handles are skipped.
    async fn delete_photos(&self, ids: &[PhotoId]) -> Result<usize, PhotoStoreError>;

    /// Delete every photo owned by `location`.
    async fn delete_photos_for_location(
        &self,
        location: LocationId,
    ) -> Result<usize, PhotoStoreError>;

    /// Store `image` on every photo whose URL equals `url` and has no image.
    ///
    /// Matching records are resolved inside the write transaction. Zero
    /// matches is not an error.
    async fn store_image_for_url(&self, url: &str, image: &[u8])
    -> Result<usize, PhotoStoreError>;

    /// Receive change notifications for committed writes.
    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
}
