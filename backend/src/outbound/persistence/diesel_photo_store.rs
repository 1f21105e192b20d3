//! SQLite-backed `PhotoStore` implementation using Diesel ORM.
//!
//! Every mutating call runs inside one immediate transaction and publishes
//! its [`StoreChange`] only after the transaction commits. Deletes and image
//! writes that touch no rows publish nothing.

use async_trait::async_trait;
use diesel::prelude::*;
use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::geo::Coordinate;
use crate::domain::ports::{
    Location, LocationId, Photo, PhotoId, PhotoStore, PhotoStoreError, StoreChange,
};

use super::database::{DbError, SqliteDatabase};
use super::diesel_helpers::{map_basic_diesel_error, map_db_error};
use super::models::{LocationRow, NewLocationRow, NewPhotoRow, PhotoRow};
use super::schema::{locations, photos};

const CHANGE_CAPACITY: usize = 256;

/// Diesel-backed implementation of the `PhotoStore` port.
#[derive(Clone)]
pub struct DieselPhotoStore {
    database: SqliteDatabase,
    changes: broadcast::Sender<StoreChange>,
}

impl DieselPhotoStore {
    /// Create a store over an opened database.
    pub fn new(database: SqliteDatabase) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self { database, changes }
    }

    fn publish(&self, change: StoreChange) {
        // No subscribers is fine.
        let _ = self.changes.send(change);
    }

    async fn run<T, F>(&self, operation: F) -> Result<T, PhotoStoreError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, PhotoStoreError> + Send + 'static,
        T: Send + 'static,
    {
        self.database.run(operation).await.map_err(map_database_error)?
    }
}

fn map_database_error(error: DbError) -> PhotoStoreError {
    map_db_error(error, PhotoStoreError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> PhotoStoreError {
    map_basic_diesel_error(error, PhotoStoreError::query, PhotoStoreError::connection)
}

fn ids_for_db(ids: &[PhotoId]) -> Vec<i64> {
    ids.iter().map(|id| id.0).collect()
}

#[async_trait]
impl PhotoStore for DieselPhotoStore {
    async fn create_location(&self, coordinate: Coordinate) -> Result<Location, PhotoStoreError> {
        let row = self
            .run(move |conn| {
                diesel::insert_into(locations::table)
                    .values(&NewLocationRow {
                        latitude: coordinate.latitude,
                        longitude: coordinate.longitude,
                    })
                    .returning(LocationRow::as_returning())
                    .get_result(conn)
                    .map_err(map_diesel_error)
            })
            .await?;
        let location = Location::from(row);
        self.publish(StoreChange::LocationCreated(location.id));
        Ok(location)
    }

    async fn location(&self, id: LocationId) -> Result<Option<Location>, PhotoStoreError> {
        self.run(move |conn| {
            locations::table
                .find(id.0)
                .select(LocationRow::as_select())
                .first(conn)
                .optional()
                .map(|row| row.map(Location::from))
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn locations(&self) -> Result<Vec<Location>, PhotoStoreError> {
        self.run(|conn| {
            locations::table
                .select(LocationRow::as_select())
                .order_by(locations::id)
                .load(conn)
                .map(|rows| rows.into_iter().map(Location::from).collect())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn delete_location(&self, id: LocationId) -> Result<bool, PhotoStoreError> {
        let deleted = self
            .run(move |conn| {
                diesel::delete(locations::table.find(id.0))
                    .execute(conn)
                    .map_err(map_diesel_error)
            })
            .await?;
        if deleted == 0 {
            return Ok(false);
        }
        debug!(location_id = %id, "deleted pin and its photos");
        self.publish(StoreChange::LocationDeleted(id));
        Ok(true)
    }

    async fn create_photos(
        &self,
        location: LocationId,
        urls: &[String],
    ) -> Result<Vec<Photo>, PhotoStoreError> {
        let urls = urls.to_vec();
        let rows = self
            .run(move |conn| {
                let inserted = conn
                    .immediate_transaction(|conn| {
                        let exists = locations::table
                            .find(location.0)
                            .select(locations::id)
                            .first::<i64>(conn)
                            .optional()?
                            .is_some();
                        if !exists {
                            return Ok(None);
                        }
                        let mut rows = Vec::with_capacity(urls.len());
                        for url in &urls {
                            let row = diesel::insert_into(photos::table)
                                .values(&NewPhotoRow {
                                    location_id: location.0,
                                    url,
                                })
                                .returning(PhotoRow::as_returning())
                                .get_result(conn)?;
                            rows.push(row);
                        }
                        Ok(Some(rows))
                    })
                    .map_err(map_diesel_error)?;
                inserted.ok_or_else(|| PhotoStoreError::missing_location(location.0))
            })
            .await?;

        let created: Vec<Photo> = rows.into_iter().map(Photo::from).collect();
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
        self.run(move |conn| {
            photos::table
                .filter(photos::location_id.eq(location.0))
                .select(PhotoRow::as_select())
                .order_by(photos::id)
                .load(conn)
                .map(|rows| rows.into_iter().map(Photo::from).collect())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn photos_with_url(&self, url: &str) -> Result<Vec<Photo>, PhotoStoreError> {
        let url = url.to_owned();
        self.run(move |conn| {
            photos::table
                .filter(photos::url.eq(url))
                .select(PhotoRow::as_select())
                .order_by(photos::id)
                .load(conn)
                .map(|rows| rows.into_iter().map(Photo::from).collect())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn delete_photos(&self, ids: &[PhotoId]) -> Result<usize, PhotoStoreError> {
        let ids = ids_for_db(ids);
        let count = self
            .run(move |conn| {
                diesel::delete(photos::table.filter(photos::id.eq_any(ids)))
                    .execute(conn)
                    .map_err(map_diesel_error)
            })
            .await?;
        if count > 0 {
            self.publish(StoreChange::PhotosDeleted { count });
        }
        Ok(count)
    }

    async fn delete_photos_for_location(
        &self,
        location: LocationId,
    ) -> Result<usize, PhotoStoreError> {
        let count = self
            .run(move |conn| {
                diesel::delete(photos::table.filter(photos::location_id.eq(location.0)))
                    .execute(conn)
                    .map_err(map_diesel_error)
            })
            .await?;
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
        let target = url.to_owned();
        let image = image.to_vec();
        let count = self
            .run(move |conn| {
                diesel::update(
                    photos::table
                        .filter(photos::url.eq(target))
                        .filter(photos::image.is_null()),
                )
                .set(photos::image.eq(Some(image)))
                .execute(conn)
                .map_err(map_diesel_error)
            })
            .await?;
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
