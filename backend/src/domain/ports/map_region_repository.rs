//! Driven port for remembering the last viewed map region.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::geo::MapRegion;

define_port_error! {
    /// Errors raised while loading or saving the map region.
    pub enum MapRegionRepositoryError {
        /// The store could not be reached.
        Connection { message: String } =>
            "map region store connection failed: {message}",
        /// The read or write failed.
        Query { message: String } =>
            "map region query failed: {message}",
    }
}

/// Port for the single persisted map region.
#[async_trait]
pub trait MapRegionRepository: Send + Sync {
    /// Load the saved region, if one was ever saved.
    async fn load(&self) -> Result<Option<MapRegion>, MapRegionRepositoryError>;

    /// Replace the saved region.
    async fn save(&self, region: &MapRegion) -> Result<(), MapRegionRepositoryError>;
}
