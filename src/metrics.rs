//! Savings of an optimized tour over a baseline.

use serde::{Deserialize, Serialize};

use crate::solver::SolveResult;

/// Average driving speed used to convert distance into time.
pub const AVERAGE_SPEED_KMH: f64 = 50.0;

/// Fuel efficiency used to convert distance into fuel.
pub const FUEL_EFFICIENCY_KM_PER_LITER: f64 = 12.0;

/// Derived comparison values, rounded to two decimals and always finite.
///
/// Savings are negative when the optimized tour is longer than the baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonMetrics {
    /// Kilometers.
    pub distance_saved: f64,
    /// Percent of the baseline distance.
    pub percent_improvement: f64,
    /// Minutes.
    pub time_saved: f64,
    /// Liters.
    pub fuel_saved: f64,
}

pub fn compare(baseline: &SolveResult, optimized: &SolveResult) -> ComparisonMetrics {
    compare_distances(baseline.total_distance_km, optimized.total_distance_km)
}

pub fn compare_distances(baseline_km: f64, optimized_km: f64) -> ComparisonMetrics {
    let saved = baseline_km - optimized_km;
    let percent = if baseline_km > 0.0 {
        saved / baseline_km * 100.0
    } else {
        0.0
    };

    ComparisonMetrics {
        distance_saved: round2(saved),
        percent_improvement: round2(percent),
        time_saved: round2(saved / AVERAGE_SPEED_KMH * 60.0),
        fuel_saved: round2(saved / FUEL_EFFICIENCY_KM_PER_LITER),
    }
}

/// Rounds to two decimals; non-finite values become zero.
pub fn round2(value: f64) -> f64 {
    if value.is_finite() {
        (value * 100.0).round() / 100.0
    } else {
        0.0
    }
}
