//! Mapping from port errors to domain errors.

use super::Error;
use super::ports::{MapRegionRepositoryError, PhotoStoreError};

pub(crate) fn map_store_error(error: PhotoStoreError) -> Error {
    match error {
        PhotoStoreError::Connection { message } => {
            Error::service_unavailable(format!("photo store unavailable: {message}"))
        }
        PhotoStoreError::Query { message } => {
            Error::internal(format!("photo store error: {message}"))
        }
        PhotoStoreError::MissingLocation { location_id } => {
            Error::not_found(format!("pin {location_id} does not exist"))
        }
    }
}

pub(crate) fn map_region_error(error: MapRegionRepositoryError) -> Error {
    match error {
        MapRegionRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("map region store unavailable: {message}"))
        }
        MapRegionRepositoryError::Query { message } => {
            Error::internal(format!("map region store error: {message}"))
        }
    }
}
