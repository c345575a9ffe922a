//! End-to-end planning: geocode names, optimize, compare with the naive
//! order.

use serde::Serialize;

use crate::error::{OptimizeError, Result};
use crate::location::Location;
use crate::metrics::{self, ComparisonMetrics};
use crate::solver::{self, SolveOptions, Strategy};
use crate::traits::{DistanceOracle, Geocoder};

/// Optimized route compared against visiting the stops as listed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationReport {
    /// Stop names in visiting order.
    pub route: Vec<String>,
    /// Kilometers, rounded to two decimals.
    pub total_distance: f64,
    /// Kilometers of the as-listed order, rounded to two decimals. `None`
    /// when that order has an unroutable leg; the metrics are then zero.
    pub original_distance: Option<f64>,
    #[serde(flatten)]
    pub metrics: ComparisonMetrics,
    pub solver: String,
    pub optimized_locations: Vec<Location>,
    pub original_locations: Vec<Location>,
}

/// Resolves every name through `geocoder`, in order.
pub fn resolve_locations<G, S>(geocoder: &G, names: &[S]) -> Result<Vec<Location>>
where
    G: Geocoder + ?Sized,
    S: AsRef<str>,
{
    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            match geocoder.resolve(name) {
                Ok(Some(location)) => Ok(location),
                Ok(None) => Err(OptimizeError::LocationNotFound(name.to_string())),
                Err(err) => Err(OptimizeError::Geocoding(format!("{name}: {err}"))),
            }
        })
        .collect()
}

/// Optimizes `cities` and reports the savings over the as-listed order.
pub fn plan<O>(
    cities: &[Location],
    strategy: Strategy,
    oracle: &O,
    options: &SolveOptions,
) -> Result<OptimizationReport>
where
    O: DistanceOracle + ?Sized,
{
    let locations = solver::prepare_locations(cities)?;
    let optimized = solver::optimize(cities, strategy, oracle, options)?;
    let original = match solver::baseline(cities, oracle, options) {
        Ok(original) => Some(original),
        Err(err) => {
            tracing::warn!(error = %err, "as-listed order cannot be evaluated, skipping comparison");
            None
        }
    };
    let metrics = original
        .as_ref()
        .map(|original| metrics::compare(original, &optimized))
        .unwrap_or_default();

    tracing::debug!(
        ?strategy,
        optimized_km = optimized.total_distance_km,
        original_km = original.as_ref().map(|o| o.total_distance_km),
        "planned route"
    );

    Ok(OptimizationReport {
        route: optimized.tour.names(),
        total_distance: metrics::round2(optimized.total_distance_km),
        original_distance: original.map(|o| metrics::round2(o.total_distance_km)),
        metrics,
        solver: optimized.solver,
        optimized_locations: optimized.tour.stops().to_vec(),
        original_locations: locations,
    })
}
