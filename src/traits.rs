//! Core seams of the planner.
//!
//! These are intentionally narrow. Routing services, geocoders and
//! optimizers are swapped by implementing them; the engine's normalization
//! and evaluation never depend on a concrete implementation.

use crate::error::{OptimizeError, OracleError};
use crate::location::{Coordinate, Location};
use crate::matrix::CostMatrix;

/// Coordinates closer than this (in degrees) are the same physical point.
pub const COINCIDENT_EPSILON_DEG: f64 = 1e-5;

/// Provides real-world travel distances in kilometers.
pub trait DistanceOracle {
    /// Bulk lookup. Row `i`, column `j` is the distance from `coords[i]` to
    /// `coords[j]`; unroutable cells are `f64::INFINITY`. The result may be
    /// asymmetric.
    fn distance_matrix(&self, coords: &[Coordinate]) -> Result<Vec<Vec<f64>>, OracleError>;

    /// Single point-to-point routing query.
    fn route_distance(&self, from: Coordinate, to: Coordinate) -> Result<f64, OracleError>;

    /// Distance between two points, never failing.
    ///
    /// Co-located points short-circuit to `0.0` without a lookup. Any lookup
    /// failure is reported as `f64::INFINITY`, meaning "no such edge".
    fn point_distance(&self, from: Coordinate, to: Coordinate) -> f64 {
        if from.degree_distance(&to) < COINCIDENT_EPSILON_DEG {
            return 0.0;
        }

        match self.route_distance(from, to) {
            Ok(km) if km.is_finite() && km >= 0.0 => km,
            Ok(km) => {
                tracing::warn!(?from, ?to, km, "discarding non-finite route distance");
                f64::INFINITY
            }
            Err(err) => {
                tracing::warn!(?from, ?to, error = %err, "route lookup failed");
                f64::INFINITY
            }
        }
    }
}

impl<T: DistanceOracle + ?Sized> DistanceOracle for &T {
    fn distance_matrix(&self, coords: &[Coordinate]) -> Result<Vec<Vec<f64>>, OracleError> {
        (**self).distance_matrix(coords)
    }

    fn route_distance(&self, from: Coordinate, to: Coordinate) -> Result<f64, OracleError> {
        (**self).route_distance(from, to)
    }
}

/// Resolves free-text place names into coordinates.
pub trait Geocoder {
    /// `Ok(None)` when the service has no match for `query`.
    fn resolve(&self, query: &str) -> Result<Option<Location>, OracleError>;
}

/// A candidate tour proposed by an optimizer.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Location indices in visiting order, not yet rotated to an anchor.
    pub permutation: Vec<usize>,
    /// The optimizer's own objective, in planning-matrix units.
    pub objective: f64,
}

/// A black-box combinatorial optimizer for the cycle over a cost matrix.
///
/// Results are untrusted: the engine validates the permutation and
/// recomputes the cost itself.
pub trait TourOptimizer {
    fn optimize(&self, matrix: &CostMatrix) -> Result<Candidate, OptimizeError>;

    fn name(&self) -> &str;
}
