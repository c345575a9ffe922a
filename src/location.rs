//! Named locations and their coordinates.

use serde::{Deserialize, Serialize};

/// A point in degrees, longitude first (the order routing services expect).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }

    /// Euclidean separation in coordinate-degree space.
    ///
    /// Not a physical distance; only used to detect co-located points.
    pub fn degree_distance(&self, other: &Coordinate) -> f64 {
        (self.lon - other.lon).hypot(self.lat - other.lat)
    }
}

impl From<(f64, f64)> for Coordinate {
    /// Builds a coordinate from a `(lon, lat)` pair.
    fn from((lon, lat): (f64, f64)) -> Self {
        Self::new(lon, lat)
    }
}

/// A named stop. Names are unique within one optimization request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(flatten)]
    pub coordinate: Coordinate,
}

impl Location {
    pub fn new(name: impl Into<String>, lon: f64, lat: f64) -> Self {
        Self {
            name: name.into(),
            coordinate: Coordinate::new(lon, lat),
        }
    }
}

/// Coordinates of `locations`, in order.
pub fn coordinates(locations: &[Location]) -> Vec<Coordinate> {
    locations.iter().map(|location| location.coordinate).collect()
}
