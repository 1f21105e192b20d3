//! Diesel table definitions for the SQLite schema.
//!
//! These definitions must match the migrations under `backend/migrations`.
//! The `diesel print-schema` command can regenerate them from a migrated
//! database file.

diesel::table! {
    /// Pins dropped on the map.
    locations (id) {
        /// Primary key assigned by SQLite.
        id -> BigInt,
        latitude -> Double,
        longitude -> Double,
    }
}

diesel::table! {
    /// Photo records owned by a pin.
    ///
    /// Rows cascade-delete with their pin. Several rows may share a `url`.
    photos (id) {
        /// Primary key assigned by SQLite.
        id -> BigInt,
        /// Owning pin.
        location_id -> BigInt,
        /// Source URL of the medium-size image.
        url -> Text,
        /// Downloaded image bytes; null until the deferred fetch lands.
        image -> Nullable<Binary>,
    }
}

diesel::table! {
    /// Last visible map region; holds at most one row with `id = 1`.
    map_region (id) {
        id -> BigInt,
        center_latitude -> Double,
        center_longitude -> Double,
        latitude_delta -> Double,
        longitude_delta -> Double,
    }
}

diesel::joinable!(photos -> locations (location_id));

diesel::allow_tables_to_appear_in_same_query!(locations, photos);
