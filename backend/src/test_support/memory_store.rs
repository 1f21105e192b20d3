//! In-memory store doubles with the same unit-of-work semantics as the
//! SQLite adapter: each call mutates under one lock and publishes its change
//! after the lock is released.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::domain::geo::{Coordinate, MapRegion};
use crate::domain::ports::{
    Location, LocationId, MapRegionRepository, MapRegionRepositoryError, Photo, PhotoId,
    PhotoStore, PhotoStoreError, StoreChange,
};

const CHANGE_CAPACITY: usize = 64;

#[derive(Default)]
struct MemoryState {
    next_location_id: i64,
    next_photo_id: i64,
    locations: Vec<Location>,
    photos: Vec<Photo>,
}

/// Pin and photo store held in memory.
pub struct InMemoryPhotoStore {
    state: Mutex<MemoryState>,
    changes: broadcast::Sender<StoreChange>,
    fail_writes: AtomicBool,
}

impl Default for InMemoryPhotoStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPhotoStore {
    /// Empty store.
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            state: Mutex::new(MemoryState::default()),
            changes,
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every later photo write fail with a query error.
    pub fn fail_photo_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Every photo across all pins, in creation order.
    pub fn all_photos(&self) -> Vec<Photo> {
        self.lock().photos.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn check_writable(&self) -> Result<(), PhotoStoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PhotoStoreError::query("scripted write failure"));
        }
        Ok(())
    }

    fn publish(&self, change: StoreChange) {
        let _ = self.changes.send(change);
    }
}

#[async_trait]
impl PhotoStore for InMemoryPhotoStore {
    async fn create_location(&self, coordinate: Coordinate) -> Result<Location, PhotoStoreError> {
        let location = {
            let mut state = self.lock();
            state.next_location_id += 1;
            let location = Location {
                id: LocationId(state.next_location_id),
                coordinate,
            };
            state.locations.push(location);
            location
        };
        self.publish(StoreChange::LocationCreated(location.id));
        Ok(location)
    }

    async fn location(&self, id: LocationId) -> Result<Option<Location>, PhotoStoreError> {
        Ok(self.lock().locations.iter().find(|loc| loc.id == id).copied())
    }

    async fn locations(&self) -> Result<Vec<Location>, PhotoStoreError> {
        Ok(self.lock().locations.clone())
    }

    async fn delete_location(&self, id: LocationId) -> Result<bool, PhotoStoreError> {
        let existed = {
            let mut state = self.lock();
            let before = state.locations.len();
            state.locations.retain(|loc| loc.id != id);
            state.photos.retain(|photo| photo.location_id != id);
            state.locations.len() != before
        };
        if existed {
            self.publish(StoreChange::LocationDeleted(id));
        }
        Ok(existed)
    }

    async fn create_photos(
        &self,
        location: LocationId,
        urls: &[String],
    ) -> Result<Vec<Photo>, PhotoStoreError> {
        self.check_writable()?;
        let created = {
            let mut state = self.lock();
            if !state.locations.iter().any(|loc| loc.id == location) {
                return Err(PhotoStoreError::missing_location(location.0));
            }
            let mut created = Vec::with_capacity(urls.len());
            for url in urls {
                state.next_photo_id += 1;
                created.push(Photo {
                    id: PhotoId(state.next_photo_id),
                    location_id: location,
                    url: url.clone(),
                    image: None,
                });
            }
            state.photos.extend(created.iter().cloned());
            created
        };
        self.publish(StoreChange::PhotosCreated {
            location_id: location,
            count: created.len(),
        });
        Ok(created)
    }

    async fn photos_for_location(
        &self,
        location: LocationId,
    ) -> Result<Vec<Photo>, PhotoStoreError> {
        Ok(self
            .lock()
            .photos
            .iter()
            .filter(|photo| photo.location_id == location)
            .cloned()
            .collect())
    }

    async fn photos_with_url(&self, url: &str) -> Result<Vec<Photo>, PhotoStoreError> {
        Ok(self
            .lock()
            .photos
            .iter()
            .filter(|photo| photo.url == url)
            .cloned()
            .collect())
    }

    async fn delete_photos(&self, ids: &[PhotoId]) -> Result<usize, PhotoStoreError> {
        let count = {
            let mut state = self.lock();
            let before = state.photos.len();
            state.photos.retain(|photo| !ids.contains(&photo.id));
            before - state.photos.len()
        };
        if count > 0 {
            self.publish(StoreChange::PhotosDeleted { count });
        }
        Ok(count)
    }

    async fn delete_photos_for_location(
        &self,
        location: LocationId,
    ) -> Result<usize, PhotoStoreError> {
        let count = {
            let mut state = self.lock();
            let before = state.photos.len();
            state.photos.retain(|photo| photo.location_id != location);
            before - state.photos.len()
        };
        if count > 0 {
            self.publish(StoreChange::PhotosDeleted { count });
        }
        Ok(count)
    }

    async fn store_image_for_url(
        &self,
        url: &str,
        image: &[u8],
    ) -> Result<usize, PhotoStoreError> {
        self.check_writable()?;
        let count = {
            let mut state = self.lock();
            let mut count = 0;
            for photo in state
                .photos
                .iter_mut()
                .filter(|photo| photo.url == url && photo.image.is_none())
            {
                photo.image = Some(image.to_vec());
                count += 1;
            }
            count
        };
        if count > 0 {
            self.publish(StoreChange::PayloadStored {
                url: url.to_owned(),
                count,
            });
        }
        Ok(count)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

/// Map region repository held in memory.
#[derive(Default)]
pub struct InMemoryMapRegionRepository {
    region: Mutex<Option<MapRegion>>,
}

#[async_trait]
impl MapRegionRepository for InMemoryMapRegionRepository {
    async fn load(&self) -> Result<Option<MapRegion>, MapRegionRepositoryError> {
        self.region
            .lock()
            .map(|guard| *guard)
            .map_err(|_| MapRegionRepositoryError::query("region mutex poisoned"))
    }

    async fn save(&self, region: &MapRegion) -> Result<(), MapRegionRepositoryError> {
        let mut guard = self
            .region
            .lock()
            .map_err(|_| MapRegionRepositoryError::query("region mutex poisoned"))?;
        *guard = Some(*region);
        Ok(())
    }
}
