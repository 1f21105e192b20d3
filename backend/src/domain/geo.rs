//! Geographic primitives: pin coordinates, search rectangles, map regions.
//!
//! Coordinates are WGS84 degrees. Search rectangles are clamped to the valid
//! longitude/latitude ranges rather than wrapped across the antimeridian or
//! the poles.

use std::fmt;

/// Half-width in degrees of the search rectangle around a pin.
pub const SEARCH_HALF_WIDTH: f64 = 1.0;
/// Half-height in degrees of the search rectangle around a pin.
pub const SEARCH_HALF_HEIGHT: f64 = 1.0;

const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);
const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);

/// A point on the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate from latitude and longitude.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Search rectangle in `[min_lon, min_lat, max_lon, max_lat]` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Western edge.
    pub min_longitude: f64,
    /// Southern edge.
    pub min_latitude: f64,
    /// Eastern edge.
    pub max_longitude: f64,
    /// Northern edge.
    pub max_latitude: f64,
}

impl BoundingBox {
    /// Rectangle of fixed margin around `center`, clamped to valid ranges.
    ///
    /// # Examples
    /// ```
    /// use pin_gallery::domain::{BoundingBox, Coordinate};
    ///
    /// let bbox = BoundingBox::around(Coordinate::new(89.5, 179.5));
    /// assert_eq!(bbox.max_latitude, 90.0);
    /// assert_eq!(bbox.max_longitude, 180.0);
    /// assert_eq!(bbox.to_string(), "178.5,88.5,180,90");
    /// ```
    pub fn around(center: Coordinate) -> Self {
        Self {
            min_longitude: (center.longitude - SEARCH_HALF_WIDTH).max(LONGITUDE_RANGE.0),
            min_latitude: (center.latitude - SEARCH_HALF_HEIGHT).max(LATITUDE_RANGE.0),
            max_longitude: (center.longitude + SEARCH_HALF_WIDTH).min(LONGITUDE_RANGE.1),
            max_latitude: (center.latitude + SEARCH_HALF_HEIGHT).min(LATITUDE_RANGE.1),
        }
    }

    /// Corners as `[min_lon, min_lat, max_lon, max_lat]`.
    pub const fn as_array(&self) -> [f64; 4] {
        [
            self.min_longitude,
            self.min_latitude,
            self.max_longitude,
            self.max_latitude,
        ]
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_longitude, self.min_latitude, self.max_longitude, self.max_latitude
        )
    }
}

/// Last viewed map region: a center and the visible span.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapRegion {
    /// Center of the visible area.
    pub center: Coordinate,
    /// Visible latitude span in degrees.
    pub latitude_delta: f64,
    /// Visible longitude span in degrees.
    pub longitude_delta: f64,
}

#[cfg(test)]
mod tests {
    //! Clamping behaviour of the search rectangle.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::origin(0.0, 0.0)]
    #[case::north_pole(90.0, 0.0)]
    #[case::south_pole(-90.0, 0.0)]
    #[case::antimeridian_east(10.0, 180.0)]
    #[case::antimeridian_west(-10.0, -180.0)]
    #[case::near_corner(-89.7, 179.9)]
    #[case::edinburgh(55.95, -3.19)]
    fn rectangle_stays_within_valid_ranges(#[case] latitude: f64, #[case] longitude: f64) {
        let bbox = BoundingBox::around(Coordinate::new(latitude, longitude));

        for value in [bbox.min_longitude, bbox.max_longitude] {
            assert!((-180.0..=180.0).contains(&value), "longitude {value} out of range");
        }
        for value in [bbox.min_latitude, bbox.max_latitude] {
            assert!((-90.0..=90.0).contains(&value), "latitude {value} out of range");
        }
        assert!(bbox.min_longitude <= bbox.max_longitude);
        assert!(bbox.min_latitude <= bbox.max_latitude);
    }

    #[rstest]
    fn clamps_instead_of_wrapping() {
        let bbox = BoundingBox::around(Coordinate::new(-89.5, -179.5));
        assert_eq!(bbox.as_array(), [-180.0, -90.0, -178.5, -88.5]);
    }

    #[rstest]
    fn interior_points_get_the_full_margin() {
        let bbox = BoundingBox::around(Coordinate::new(10.0, 20.0));
        assert_eq!(bbox.as_array(), [19.0, 9.0, 21.0, 11.0]);
        assert_eq!(bbox.to_string(), "19,9,21,11");
    }
}
