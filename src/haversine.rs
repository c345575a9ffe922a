//! Haversine distance oracle (fallback when no routing service is available).
//!
//! Uses great-circle distance scaled by a detour factor.
//! Less accurate than a road network but always available.

use crate::error::OracleError;
use crate::location::Coordinate;
use crate::traits::DistanceOracle;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance oracle.
///
/// Distances are multiplied by `detour_factor` to approximate the extra
/// length of road travel over a straight line.
#[derive(Debug, Clone)]
pub struct HaversineOracle {
    pub detour_factor: f64,
}

impl Default for HaversineOracle {
    fn default() -> Self {
        Self { detour_factor: 1.0 }
    }
}

impl HaversineOracle {
    pub fn new(detour_factor: f64) -> Self {
        Self { detour_factor }
    }

    /// Calculate haversine distance between two points in kilometers.
    pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
        let lat1_rad = from.lat.to_radians();
        let lat2_rad = to.lat.to_radians();
        let delta_lat = (to.lat - from.lat).to_radians();
        let delta_lon = (to.lon - from.lon).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }
}

impl DistanceOracle for HaversineOracle {
    fn distance_matrix(&self, coords: &[Coordinate]) -> Result<Vec<Vec<f64>>, OracleError> {
        let n = coords.len();
        let mut matrix = vec![vec![0.0; n]; n];

        for (i, from) in coords.iter().enumerate() {
            for (j, to) in coords.iter().enumerate() {
                if i != j {
                    matrix[i][j] = Self::haversine_km(*from, *to) * self.detour_factor;
                }
            }
        }

        Ok(matrix)
    }

    fn route_distance(&self, from: Coordinate, to: Coordinate) -> Result<f64, OracleError> {
        Ok(Self::haversine_km(from, to) * self.detour_factor)
    }
}
