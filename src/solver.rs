//! Route optimization engine.
//!
//! Every entry point runs the same pipeline: build the cost matrix, solve
//! for an index permutation, rotate it to the anchor, then recompute the
//! true cost leg by leg through the oracle. The cost a solver computes for
//! itself is never reported.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{OptimizeError, Result};
use crate::location::{Location, coordinates};
use crate::matrix::CostMatrix;
use crate::tour::{self, Tour};
use crate::traits::{DistanceOracle, TourOptimizer};
use crate::variational::{VariationalConfig, VariationalOptimizer};

/// Which solver to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Deterministic nearest-neighbor construction.
    #[default]
    Heuristic,
    /// Variational sampler over the QUBO formulation.
    Approximate,
}

#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Index into the caller's list of the location every tour starts from.
    ///
    /// Resolved by name after duplicates collapse, so pointing at a repeated
    /// name starts from its first occurrence. The lower-level `solve_*`
    /// functions take it as an index into their prepared locations.
    pub anchor: usize,
    /// Return to the start (closed cycle) instead of ending at the last stop.
    pub closed: bool,
    /// Settings for [`Strategy::Approximate`].
    pub variational: VariationalConfig,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            anchor: 0,
            closed: true,
            variational: VariationalConfig::default(),
        }
    }
}

/// A finished tour and its verified length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveResult {
    pub tour: Tour,
    /// Sum of point-to-point oracle distances along the tour.
    pub total_distance_km: f64,
    /// Name of the solver that produced the order.
    pub solver: String,
}

/// Optimizes the visiting order of `cities`.
pub fn optimize<O>(
    cities: &[Location],
    strategy: Strategy,
    oracle: &O,
    options: &SolveOptions,
) -> Result<SolveResult>
where
    O: DistanceOracle + ?Sized,
{
    match strategy {
        Strategy::Heuristic => {
            let (locations, options) = prepare_with_anchor(cities, options)?;
            let matrix = CostMatrix::build(oracle, &coordinates(&locations))?;
            solve_heuristic(&locations, &matrix, oracle, &options)
        }
        Strategy::Approximate => {
            let optimizer = VariationalOptimizer::new(options.variational.clone());
            optimize_with(cities, oracle, &optimizer, options)
        }
    }
}

/// Optimizes the visiting order of `cities` with a custom optimizer.
pub fn optimize_with<O, T>(
    cities: &[Location],
    oracle: &O,
    optimizer: &T,
    options: &SolveOptions,
) -> Result<SolveResult>
where
    O: DistanceOracle + ?Sized,
    T: TourOptimizer + ?Sized,
{
    let (locations, options) = prepare_with_anchor(cities, options)?;
    let matrix = CostMatrix::build(oracle, &coordinates(&locations))?;
    solve_approximate(&locations, &matrix, oracle, optimizer, &options)
}

/// Evaluates `cities` in the order given, as the naive baseline.
pub fn baseline<O>(cities: &[Location], oracle: &O, options: &SolveOptions) -> Result<SolveResult>
where
    O: DistanceOracle + ?Sized,
{
    let locations = prepare_locations(cities)?;
    let order: Vec<usize> = (0..locations.len()).collect();
    finish(&locations, &order, oracle, options.closed, "sequential")
}

/// Nearest-neighbor construction on `matrix` from `start`.
///
/// Each step moves to the closest unvisited location; ties go to the lowest
/// index. Fails if the current location has no routable unvisited neighbour.
pub fn nearest_neighbor(matrix: &CostMatrix, start: usize) -> Result<Vec<usize>> {
    let n = matrix.size();
    check_anchor(start, n)?;

    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    visited[start] = true;
    order.push(start);

    let mut current = start;
    for _ in 1..n {
        let mut nearest: Option<(usize, f64)> = None;
        for (candidate, &cost) in matrix.row(current).iter().enumerate() {
            if visited[candidate] || !cost.is_finite() {
                continue;
            }
            if nearest.is_none_or(|(_, best)| cost < best) {
                nearest = Some((candidate, cost));
            }
        }

        let (next, _) = nearest.ok_or(OptimizeError::NoFeasiblePath { from: current })?;
        visited[next] = true;
        order.push(next);
        current = next;
    }

    Ok(order)
}

/// Nearest-neighbor tour of `locations` starting at the anchor.
pub fn solve_heuristic<O>(
    locations: &[Location],
    matrix: &CostMatrix,
    oracle: &O,
    options: &SolveOptions,
) -> Result<SolveResult>
where
    O: DistanceOracle + ?Sized,
{
    let order = nearest_neighbor(matrix, options.anchor)?;
    tracing::debug!(?order, "nearest-neighbor order");
    finish(locations, &order, oracle, options.closed, "nearest-neighbor")
}

/// Tour of `locations` proposed by `optimizer`, validated and re-costed.
pub fn solve_approximate<O, T>(
    locations: &[Location],
    matrix: &CostMatrix,
    oracle: &O,
    optimizer: &T,
    options: &SolveOptions,
) -> Result<SolveResult>
where
    O: DistanceOracle + ?Sized,
    T: TourOptimizer + ?Sized,
{
    let n = matrix.size();
    check_anchor(options.anchor, n)?;

    let candidate = optimizer.optimize(matrix)?;
    tour::validate_permutation(&candidate.permutation, n)?;

    let order = tour::normalize(&candidate.permutation, options.anchor);
    if let Some((from, to)) = unroutable_leg(matrix, &order, options.closed) {
        return Err(OptimizeError::invalid_decode(format!(
            "tour uses unroutable leg {} -> {}",
            locations[from].name, locations[to].name
        )));
    }

    let result = finish(locations, &order, oracle, options.closed, optimizer.name())?;
    tracing::debug!(
        solver = optimizer.name(),
        planned_km = candidate.objective,
        verified_km = result.total_distance_km,
        "approximate solve finished"
    );
    Ok(result)
}

/// Collapses duplicate names to their first occurrence and drops locations
/// without usable coordinates.
pub fn prepare_locations(cities: &[Location]) -> Result<Vec<Location>> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(cities.len());
    for city in cities {
        if !city.coordinate.is_finite() {
            tracing::warn!(name = %city.name, "skipping location with non-finite coordinates");
            continue;
        }
        if seen.insert(city.name.as_str()) {
            unique.push(city.clone());
        }
    }

    if unique.len() < 2 {
        return Err(OptimizeError::InsufficientLocations(unique.len()));
    }
    Ok(unique)
}

/// Prepares `cities` and maps the anchor onto the prepared list.
fn prepare_with_anchor(
    cities: &[Location],
    options: &SolveOptions,
) -> Result<(Vec<Location>, SolveOptions)> {
    let locations = prepare_locations(cities)?;
    let anchor = cities
        .get(options.anchor)
        .and_then(|city| locations.iter().position(|l| l.name == city.name))
        .ok_or(OptimizeError::InvalidAnchor {
            anchor: options.anchor,
            size: cities.len(),
        })?;

    let options = SolveOptions {
        anchor,
        ..options.clone()
    };
    Ok((locations, options))
}

fn check_anchor(anchor: usize, size: usize) -> Result<()> {
    if anchor < size {
        Ok(())
    } else {
        Err(OptimizeError::InvalidAnchor { anchor, size })
    }
}

fn unroutable_leg(matrix: &CostMatrix, order: &[usize], closed: bool) -> Option<(usize, usize)> {
    let mut legs: Vec<(usize, usize)> = order.windows(2).map(|leg| (leg[0], leg[1])).collect();
    if closed {
        if let (Some(&last), Some(&first)) = (order.last(), order.first()) {
            legs.push((last, first));
        }
    }
    legs.into_iter().find(|&(from, to)| !matrix.is_routable(from, to))
}

fn finish<O>(
    locations: &[Location],
    order: &[usize],
    oracle: &O,
    closed: bool,
    solver: &str,
) -> Result<SolveResult>
where
    O: DistanceOracle + ?Sized,
{
    let stops = tour::resolve(order, locations);
    let tour = if closed { Tour::closed(stops) } else { Tour::open(stops) };
    let total_distance_km = tour::evaluate(tour.stops(), oracle)?;

    Ok(SolveResult {
        tour,
        total_distance_km,
        solver: solver.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(raw: Vec<Vec<f64>>) -> CostMatrix {
        CostMatrix::from_raw(raw).unwrap()
    }

    #[test]
    fn test_nearest_neighbor_tie_breaks_low_index() {
        let m = matrix(vec![
            vec![0.0, 1.0, 1.0],
            vec![1.0, 0.0, 1.4],
            vec![1.0, 1.4, 0.0],
        ]);
        assert_eq!(nearest_neighbor(&m, 0).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_nearest_neighbor_greedy_choice() {
        let m = matrix(vec![
            vec![0.0, 5.0, 1.0, 9.0],
            vec![5.0, 0.0, 2.0, 1.0],
            vec![1.0, 2.0, 0.0, 8.0],
            vec![9.0, 1.0, 8.0, 0.0],
        ]);
        assert_eq!(nearest_neighbor(&m, 0).unwrap(), vec![0, 2, 1, 3]);
        assert_eq!(nearest_neighbor(&m, 3).unwrap(), vec![3, 1, 2, 0]);
    }

    #[test]
    fn test_nearest_neighbor_skips_unroutable() {
        let inf = f64::INFINITY;
        let m = matrix(vec![
            vec![0.0, inf, 3.0],
            vec![inf, 0.0, 1.0],
            vec![3.0, 1.0, 0.0],
        ]);
        assert_eq!(nearest_neighbor(&m, 0).unwrap(), vec![0, 2, 1]);
    }

    #[test]
    fn test_nearest_neighbor_dead_end() {
        let inf = f64::INFINITY;
        let m = matrix(vec![
            vec![0.0, 1.0, inf],
            vec![1.0, 0.0, inf],
            vec![inf, inf, 0.0],
        ]);
        assert_eq!(
            nearest_neighbor(&m, 0).unwrap_err(),
            OptimizeError::NoFeasiblePath { from: 1 }
        );
    }

    #[test]
    fn test_nearest_neighbor_rejects_bad_start() {
        let m = matrix(vec![vec![0.0, 1.0], vec![1.0, 0.0]]);
        assert_eq!(
            nearest_neighbor(&m, 2).unwrap_err(),
            OptimizeError::InvalidAnchor { anchor: 2, size: 2 }
        );
    }

    #[test]
    fn test_prepare_locations_dedupes_names() {
        let cities = vec![
            Location::new("a", 0.0, 0.0),
            Location::new("b", 1.0, 0.0),
            Location::new("a", 5.0, 5.0),
        ];
        let prepared = prepare_locations(&cities).unwrap();
        assert_eq!(prepared.len(), 2);
        assert_eq!(prepared[0].coordinate.lon, 0.0);
    }

    #[test]
    fn test_prepare_locations_needs_two() {
        let cities = vec![
            Location::new("a", 0.0, 0.0),
            Location::new("a", 0.0, 0.0),
            Location::new("b", f64::NAN, 0.0),
        ];
        assert_eq!(
            prepare_locations(&cities).unwrap_err(),
            OptimizeError::InsufficientLocations(1)
        );
    }

    #[test]
    fn test_unroutable_leg_respects_closing_edge() {
        let inf = f64::INFINITY;
        let m = matrix(vec![
            vec![0.0, 1.0, inf],
            vec![1.0, 0.0, 1.0],
            vec![inf, 1.0, 0.0],
        ]);
        assert_eq!(unroutable_leg(&m, &[0, 1, 2], false), None);
        assert_eq!(unroutable_leg(&m, &[0, 1, 2], true), Some((2, 0)));
    }

    #[test]
    fn test_strategy_serde_is_lowercase() {
        let parsed: Strategy = serde_json::from_str("\"approximate\"").unwrap();
        assert_eq!(parsed, Strategy::Approximate);
        assert_eq!(serde_json::to_string(&Strategy::Heuristic).unwrap(), "\"heuristic\"");
    }
}
