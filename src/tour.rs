//! Tour normalization and route evaluation.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{OptimizeError, Result};
use crate::location::Location;
use crate::traits::DistanceOracle;

/// An ordered sequence of stops.
///
/// A closed tour repeats its first stop at the end; the open-path prefix
/// always lists each stop once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tour {
    stops: Vec<Location>,
    closed: bool,
}

impl Tour {
    pub fn open(stops: Vec<Location>) -> Self {
        Self {
            stops,
            closed: false,
        }
    }

    /// Closes `stops` by appending the first stop again.
    pub fn closed(stops: Vec<Location>) -> Self {
        Self {
            stops: close(&stops),
            closed: true,
        }
    }

    pub fn stops(&self) -> &[Location] {
        &self.stops
    }

    /// The stops without the repeated return stop.
    pub fn open_path(&self) -> &[Location] {
        if self.closed && !self.stops.is_empty() {
            &self.stops[..self.stops.len() - 1]
        } else {
            &self.stops
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn names(&self) -> Vec<String> {
        self.stops.iter().map(|stop| stop.name.clone()).collect()
    }

    /// True if the open path visits exactly the named `locations`, once each.
    pub fn is_permutation_of(&self, locations: &[Location]) -> bool {
        let path = self.open_path();
        if path.len() != locations.len() {
            return false;
        }
        let mut seen = HashSet::with_capacity(path.len());
        let expected: HashSet<&str> = locations.iter().map(|l| l.name.as_str()).collect();
        path.iter()
            .all(|stop| expected.contains(stop.name.as_str()) && seen.insert(stop.name.as_str()))
    }
}

/// Rotates a cyclic `permutation` so `anchor` comes first.
///
/// Relative order is preserved. If `anchor` is not in the permutation it is
/// returned unrotated.
pub fn normalize(permutation: &[usize], anchor: usize) -> Vec<usize> {
    match permutation.iter().position(|&index| index == anchor) {
        Some(at) => {
            let mut rotated = permutation.to_vec();
            rotated.rotate_left(at);
            rotated
        }
        None => {
            tracing::warn!(anchor, ?permutation, "anchor missing from permutation, leaving unrotated");
            permutation.to_vec()
        }
    }
}

/// Appends the first element to form an explicit return-to-start edge.
pub fn close<T: Clone>(open: &[T]) -> Vec<T> {
    let mut closed = open.to_vec();
    if let Some(first) = open.first() {
        closed.push(first.clone());
    }
    closed
}

/// Checks that `permutation` visits every index in `0..size` exactly once.
pub fn validate_permutation(permutation: &[usize], size: usize) -> Result<()> {
    if permutation.len() != size {
        return Err(OptimizeError::invalid_decode(format!(
            "expected {size} stops, got {}",
            permutation.len()
        )));
    }
    let mut seen = vec![false; size];
    for &index in permutation {
        if index >= size {
            return Err(OptimizeError::invalid_decode(format!("index {index} out of range")));
        }
        if std::mem::replace(&mut seen[index], true) {
            return Err(OptimizeError::invalid_decode(format!("index {index} visited twice")));
        }
    }
    Ok(())
}

/// Maps indices back to their locations.
pub fn resolve(order: &[usize], locations: &[Location]) -> Vec<Location> {
    order.iter().map(|&index| locations[index].clone()).collect()
}

/// Recomputes the true cost of `stops` leg by leg through the oracle.
///
/// A single unroutable leg fails the whole evaluation.
pub fn evaluate<O>(stops: &[Location], oracle: &O) -> Result<f64>
where
    O: DistanceOracle + ?Sized,
{
    let mut total = 0.0;
    for leg in stops.windows(2) {
        let km = oracle.point_distance(leg[0].coordinate, leg[1].coordinate);
        if !km.is_finite() {
            return Err(OptimizeError::UnroutableSegment {
                from: leg[0].name.clone(),
                to: leg[1].name.clone(),
            });
        }
        total += km;
    }
    Ok(total)
}
