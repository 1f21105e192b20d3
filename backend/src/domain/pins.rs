//! Pin management: create, list and delete pins and their photos, and
//! remember where the map was last looking.

use std::sync::Arc;

use tracing::debug;

use super::Error;
use super::geo::{Coordinate, MapRegion};
use super::mapping::{map_region_error, map_store_error};
use super::ports::{Location, LocationId, MapRegionRepository, Photo, PhotoId, PhotoStore};

/// Domain service behind the map surface.
pub struct PinService {
    store: Arc<dyn PhotoStore>,
    regions: Arc<dyn MapRegionRepository>,
}

impl PinService {
    /// Build the service from its ports.
    pub fn new(store: Arc<dyn PhotoStore>, regions: Arc<dyn MapRegionRepository>) -> Self {
        Self { store, regions }
    }

    /// Create a pin at `coordinate`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::invalid_request`] for non-finite or out-of-range
    /// coordinates, or a mapped store error.
    pub async fn drop_pin(&self, coordinate: Coordinate) -> Result<Location, Error> {
        validate_coordinate(coordinate)?;
        let location = self
            .store
            .create_location(coordinate)
            .await
            .map_err(map_store_error)?;
        debug!(location_id = %location.id, %coordinate, "dropped pin");
        Ok(location)
    }

    /// All pins.
    ///
    /// # Errors
    ///
    /// Returns a mapped store error.
    pub async fn pins(&self) -> Result<Vec<Location>, Error> {
        self.store.locations().await.map_err(map_store_error)
    }

    /// One pin.
    ///
    /// # Errors
    ///
    /// Returns [`Error::not_found`] for unknown ids.
    pub async fn pin(&self, id: LocationId) -> Result<Location, Error> {
        self.store
            .location(id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| Error::not_found(format!("pin {id} does not exist")))
    }

    /// Delete a pin and its photos.
    ///
    /// # Errors
    ///
    /// Returns [`Error::not_found`] for unknown ids.
    pub async fn remove_pin(&self, id: LocationId) -> Result<(), Error> {
        let existed = self
            .store
            .delete_location(id)
            .await
            .map_err(map_store_error)?;
        if !existed {
            return Err(Error::not_found(format!("pin {id} does not exist")));
        }
        Ok(())
    }

    /// Photos of a pin.
    ///
    /// # Errors
    ///
    /// Returns [`Error::not_found`] for unknown ids.
    pub async fn photos(&self, id: LocationId) -> Result<Vec<Photo>, Error> {
        let location = self.pin(id).await?;
        self.store
            .photos_for_location(location.id)
            .await
            .map_err(map_store_error)
    }

    /// Delete selected photos; returns how many existed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::invalid_request`] when `ids` is empty.
    pub async fn remove_photos(&self, ids: &[PhotoId]) -> Result<usize, Error> {
        if ids.is_empty() {
            return Err(Error::invalid_request("select at least one photo to remove"));
        }
        self.store.delete_photos(ids).await.map_err(map_store_error)
    }

    /// Persist the visible map region.
    ///
    /// # Errors
    ///
    /// Returns [`Error::invalid_request`] for invalid centers or negative
    /// spans, or a mapped store error.
    pub async fn remember_region(&self, region: MapRegion) -> Result<(), Error> {
        validate_coordinate(region.center)?;
        if !(region.latitude_delta.is_finite() && region.latitude_delta >= 0.0)
            || !(region.longitude_delta.is_finite() && region.longitude_delta >= 0.0)
        {
            return Err(Error::invalid_request(
                "map region span must be finite and non-negative",
            ));
        }
        self.regions.save(&region).await.map_err(map_region_error)
    }

    /// Region saved by the last [`Self::remember_region`], if any.
    ///
    /// # Errors
    ///
    /// Returns a mapped store error.
    pub async fn last_region(&self) -> Result<Option<MapRegion>, Error> {
        self.regions.load().await.map_err(map_region_error)
    }
}

fn validate_coordinate(coordinate: Coordinate) -> Result<(), Error> {
    let Coordinate {
        latitude,
        longitude,
    } = coordinate;
    if !latitude.is_finite() || !longitude.is_finite() {
        return Err(Error::invalid_request("coordinates must be finite"));
    }
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(Error::invalid_request("latitude must be within [-90, 90]"));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(Error::invalid_request(
            "longitude must be within [-180, 180]",
        ));
    }
    Ok(())
}
