//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod map_region_repository;
mod photo_store;
mod photo_transport;

pub use map_region_repository::{MapRegionRepository, MapRegionRepositoryError};
pub use photo_store::{
    Location, LocationId, Photo, PhotoId, PhotoStore, PhotoStoreError, StoreChange,
};
#[cfg(test)]
pub use photo_transport::MockPhotoTransport;
pub use photo_transport::{PhotoTransport, RawResponse, TransportError};
