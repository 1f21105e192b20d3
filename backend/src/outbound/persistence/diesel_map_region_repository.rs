//! SQLite-backed `MapRegionRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;

use crate::domain::geo::MapRegion;
use crate::domain::ports::{MapRegionRepository, MapRegionRepositoryError};

use super::database::{DbError, SqliteDatabase};
use super::diesel_helpers::{map_basic_diesel_error, map_db_error};
use super::models::{MAP_REGION_ROW_ID, MapRegionRow};
use super::schema::map_region;

/// Diesel-backed implementation of the `MapRegionRepository` port.
///
/// The region lives in a single row that every save replaces.
#[derive(Clone)]
pub struct DieselMapRegionRepository {
    database: SqliteDatabase,
}

impl DieselMapRegionRepository {
    /// Create a repository over an opened database.
    pub fn new(database: SqliteDatabase) -> Self {
        Self { database }
    }
}

fn map_database_error(error: DbError) -> MapRegionRepositoryError {
    map_db_error(error, MapRegionRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> MapRegionRepositoryError {
    map_basic_diesel_error(
        error,
        MapRegionRepositoryError::query,
        MapRegionRepositoryError::connection,
    )
}

#[async_trait]
impl MapRegionRepository for DieselMapRegionRepository {
    async fn load(&self) -> Result<Option<MapRegion>, MapRegionRepositoryError> {
        let row = self
            .database
            .run(|conn| {
                map_region::table
                    .find(MAP_REGION_ROW_ID)
                    .select(MapRegionRow::as_select())
                    .first(conn)
                    .optional()
            })
            .await
            .map_err(map_database_error)?
            .map_err(map_diesel_error)?;
        Ok(row.map(MapRegion::from))
    }

    async fn save(&self, region: &MapRegion) -> Result<(), MapRegionRepositoryError> {
        let row = MapRegionRow::from(region);
        self.database
            .run(move |conn| {
                diesel::replace_into(map_region::table)
                    .values(&row)
                    .execute(conn)
            })
            .await
            .map_err(map_database_error)?
            .map_err(map_diesel_error)?;
        Ok(())
    }
}
