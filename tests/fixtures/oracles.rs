//! Scripted distance oracles.

use std::sync::atomic::{AtomicUsize, Ordering};

use tour_planner::error::OracleError;
use tour_planner::traits::DistanceOracle;
use tour_planner::{Coordinate, Location};

/// Answers from a fixed table keyed by the coordinates it was built with.
///
/// Infinite cells are reported as "no route" by single lookups.
pub struct TableOracle {
    coords: Vec<Coordinate>,
    table: Vec<Vec<f64>>,
    matrix_calls: AtomicUsize,
    route_calls: AtomicUsize,
}

impl TableOracle {
    pub fn new(locations: &[Location], table: Vec<Vec<f64>>) -> Self {
        assert_eq!(locations.len(), table.len());
        Self {
            coords: locations.iter().map(|l| l.coordinate).collect(),
            table,
            matrix_calls: AtomicUsize::new(0),
            route_calls: AtomicUsize::new(0),
        }
    }

    pub fn matrix_calls(&self) -> usize {
        self.matrix_calls.load(Ordering::SeqCst)
    }

    pub fn route_calls(&self) -> usize {
        self.route_calls.load(Ordering::SeqCst)
    }

    fn index(&self, coord: Coordinate) -> Result<usize, OracleError> {
        self.coords
            .iter()
            .position(|c| c.lon == coord.lon && c.lat == coord.lat)
            .ok_or_else(|| OracleError::invalid_response(format!("unknown coordinate {coord:?}")))
    }
}

impl DistanceOracle for TableOracle {
    fn distance_matrix(&self, coords: &[Coordinate]) -> Result<Vec<Vec<f64>>, OracleError> {
        self.matrix_calls.fetch_add(1, Ordering::SeqCst);
        let indices = coords
            .iter()
            .map(|&c| self.index(c))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(indices
            .iter()
            .map(|&i| indices.iter().map(|&j| self.table[i][j]).collect())
            .collect())
    }

    fn route_distance(&self, from: Coordinate, to: Coordinate) -> Result<f64, OracleError> {
        self.route_calls.fetch_add(1, Ordering::SeqCst);
        let km = self.table[self.index(from)?][self.index(to)?];
        if km.is_finite() { Ok(km) } else { Err(OracleError::NoRoute) }
    }
}

/// Every pair of distinct points is unroutable.
pub struct UnreachableOracle;

impl DistanceOracle for UnreachableOracle {
    fn distance_matrix(&self, coords: &[Coordinate]) -> Result<Vec<Vec<f64>>, OracleError> {
        let n = coords.len();
        Ok((0..n)
            .map(|i| (0..n).map(|j| if i == j { 0.0 } else { f64::INFINITY }).collect())
            .collect())
    }

    fn route_distance(&self, _from: Coordinate, _to: Coordinate) -> Result<f64, OracleError> {
        Err(OracleError::NoRoute)
    }
}

/// Bulk lookups fail outright.
pub struct OfflineOracle;

impl DistanceOracle for OfflineOracle {
    fn distance_matrix(&self, _coords: &[Coordinate]) -> Result<Vec<Vec<f64>>, OracleError> {
        Err(OracleError::invalid_response("service unavailable"))
    }

    fn route_distance(&self, _from: Coordinate, _to: Coordinate) -> Result<f64, OracleError> {
        Err(OracleError::NoRoute)
    }
}

/// Zero-cost matrix; any single-route lookup is a test failure.
pub struct NoLookupOracle;

impl DistanceOracle for NoLookupOracle {
    fn distance_matrix(&self, coords: &[Coordinate]) -> Result<Vec<Vec<f64>>, OracleError> {
        Ok(vec![vec![0.0; coords.len()]; coords.len()])
    }

    fn route_distance(&self, from: Coordinate, to: Coordinate) -> Result<f64, OracleError> {
        panic!("unexpected route lookup {from:?} -> {to:?}");
    }
}
