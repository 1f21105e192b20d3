//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use diesel::prelude::*;

use crate::domain::geo::{Coordinate, MapRegion};
use crate::domain::ports::{Location, LocationId, Photo, PhotoId};

use super::schema::{locations, map_region, photos};

/// Row struct for reading from the locations table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = locations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub(crate) struct LocationRow {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Self {
            id: LocationId(row.id),
            coordinate: Coordinate::new(row.latitude, row.longitude),
        }
    }
}

/// Insertable struct for creating pins.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = locations)]
pub(crate) struct NewLocationRow {
    pub latitude: f64,
    pub longitude: f64,
}

/// Row struct for reading from the photos table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = photos)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub(crate) struct PhotoRow {
    pub id: i64,
    pub location_id: i64,
    pub url: String,
    pub image: Option<Vec<u8>>,
}

impl From<PhotoRow> for Photo {
    fn from(row: PhotoRow) -> Self {
        Self {
            id: PhotoId(row.id),
            location_id: LocationId(row.location_id),
            url: row.url,
            image: row.image,
        }
    }
}

/// Insertable struct for creating photo records without image bytes.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = photos)]
pub(crate) struct NewPhotoRow<'a> {
    pub location_id: i64,
    pub url: &'a str,
}

// ---------------------------------------------------------------------------
// Map region
// ---------------------------------------------------------------------------

/// Primary key of the single map region row.
pub(crate) const MAP_REGION_ROW_ID: i64 = 1;

/// Row struct for reading and replacing the map region.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = map_region)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub(crate) struct MapRegionRow {
    pub id: i64,
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl From<&MapRegion> for MapRegionRow {
    fn from(region: &MapRegion) -> Self {
        Self {
            id: MAP_REGION_ROW_ID,
            center_latitude: region.center.latitude,
            center_longitude: region.center.longitude,
            latitude_delta: region.latitude_delta,
            longitude_delta: region.longitude_delta,
        }
    }
}

impl From<MapRegionRow> for MapRegion {
    fn from(row: MapRegionRow) -> Self {
        Self {
            center: Coordinate::new(row.center_latitude, row.center_longitude),
            latitude_delta: row.latitude_delta,
            longitude_delta: row.longitude_delta,
        }
    }
}
