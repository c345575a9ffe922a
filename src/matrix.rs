//! Symmetric pairwise cost matrix.

use crate::error::{OptimizeError, Result};
use crate::location::Coordinate;
use crate::traits::DistanceOracle;

/// A dense N×N matrix of road distances in kilometers, stored row-major.
///
/// Symmetric with a zero diagonal. `f64::INFINITY` marks a pair with no
/// route. There is no mutation API once built.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    data: Vec<f64>,
    size: usize,
}

impl CostMatrix {
    /// Builds the matrix for `coords` with a single batched oracle call.
    pub fn build<O>(oracle: &O, coords: &[Coordinate]) -> Result<Self>
    where
        O: DistanceOracle + ?Sized,
    {
        match coords.len() {
            0 => Err(OptimizeError::InsufficientLocations(0)),
            1 => Ok(Self {
                data: vec![0.0],
                size: 1,
            }),
            n => {
                let raw = oracle
                    .distance_matrix(coords)
                    .map_err(|err| OptimizeError::matrix_unavailable(err.to_string()))?;
                if raw.len() != n {
                    return Err(OptimizeError::matrix_unavailable(format!(
                        "expected {n} rows, oracle returned {}",
                        raw.len()
                    )));
                }
                let matrix = Self::from_raw(raw)?;
                tracing::debug!(size = n, isolated = ?matrix.isolated_location(), "built cost matrix");
                Ok(matrix)
            }
        }
    }

    /// Symmetrizes raw, possibly asymmetric, oracle output.
    ///
    /// Each unordered pair becomes the average of both directions. NaN and
    /// negative entries are treated as missing routes.
    pub fn from_raw(raw: Vec<Vec<f64>>) -> Result<Self> {
        let size = raw.len();
        if size == 0 {
            return Err(OptimizeError::matrix_unavailable("oracle returned no distances"));
        }
        if let Some(row) = raw.iter().position(|row| row.len() != size) {
            return Err(OptimizeError::matrix_unavailable(format!(
                "row {row} has {} columns, expected {size}",
                raw[row].len()
            )));
        }

        let mut data = vec![0.0; size * size];
        for i in 0..size {
            for j in (i + 1)..size {
                let cost = (sanitize(raw[i][j]) + sanitize(raw[j][i])) / 2.0;
                data[i * size + j] = cost;
                data[j * size + i] = cost;
            }
        }

        Ok(Self { data, size })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.data[from * self.size + to]
    }

    pub fn row(&self, from: usize) -> &[f64] {
        &self.data[from * self.size..(from + 1) * self.size]
    }

    pub fn is_routable(&self, from: usize, to: usize) -> bool {
        self.get(from, to).is_finite()
    }

    /// Largest finite off-diagonal entry, if any pair is routable.
    pub fn max_finite(&self) -> Option<f64> {
        (0..self.size)
            .flat_map(|i| (0..self.size).filter(move |&j| j != i).map(move |j| (i, j)))
            .map(|(i, j)| self.get(i, j))
            .filter(|cost| cost.is_finite())
            .fold(None, |max, cost| Some(max.map_or(cost, |m: f64| m.max(cost))))
    }

    /// First location with no finite edge to any other location.
    pub fn isolated_location(&self) -> Option<usize> {
        if self.size < 2 {
            return None;
        }
        (0..self.size).find(|&i| (0..self.size).all(|j| i == j || !self.is_routable(i, j)))
    }

    /// Cost of the cycle visiting `order` and returning to its first entry.
    pub fn cycle_cost(&self, order: &[usize]) -> f64 {
        if order.len() < 2 {
            return 0.0;
        }
        order
            .iter()
            .zip(order.iter().cycle().skip(1))
            .map(|(&from, &to)| self.get(from, to))
            .sum()
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_nan() || value < 0.0 {
        f64::INFINITY
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OracleError;

    struct RawOracle(Vec<Vec<f64>>);

    impl DistanceOracle for RawOracle {
        fn distance_matrix(&self, _coords: &[Coordinate]) -> std::result::Result<Vec<Vec<f64>>, OracleError> {
            Ok(self.0.clone())
        }

        fn route_distance(&self, _from: Coordinate, _to: Coordinate) -> std::result::Result<f64, OracleError> {
            Err(OracleError::NoRoute)
        }
    }

    struct DownOracle;

    impl DistanceOracle for DownOracle {
        fn distance_matrix(&self, _coords: &[Coordinate]) -> std::result::Result<Vec<Vec<f64>>, OracleError> {
            Err(OracleError::invalid_response("service unavailable"))
        }

        fn route_distance(&self, _from: Coordinate, _to: Coordinate) -> std::result::Result<f64, OracleError> {
            Err(OracleError::NoRoute)
        }
    }

    fn coords(n: usize) -> Vec<Coordinate> {
        (0..n).map(|i| Coordinate::new(i as f64, 0.0)).collect()
    }

    #[test]
    fn test_symmetrizes_asymmetric_output() {
        let raw = vec![
            vec![0.0, 2.0, 7.0],
            vec![4.0, 0.0, 1.0],
            vec![3.0, 5.0, 0.0],
        ];
        let matrix = CostMatrix::build(&RawOracle(raw), &coords(3)).unwrap();

        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
            }
        }
        assert_eq!(matrix.get(0, 1), 3.0);
        assert_eq!(matrix.get(0, 2), 5.0);
        assert_eq!(matrix.get(1, 2), 3.0);
    }

    #[test]
    fn test_diagonal_is_zero() {
        let raw = vec![vec![9.0, 1.0], vec![1.0, 9.0]];
        let matrix = CostMatrix::from_raw(raw).unwrap();
        assert_eq!(matrix.get(0, 0), 0.0);
        assert_eq!(matrix.get(1, 1), 0.0);
    }

    #[test]
    fn test_one_way_route_is_unroutable() {
        let raw = vec![vec![0.0, 1.0], vec![f64::INFINITY, 0.0]];
        let matrix = CostMatrix::from_raw(raw).unwrap();
        assert!(!matrix.is_routable(0, 1));
        assert!(!matrix.is_routable(1, 0));
    }

    #[test]
    fn test_nan_and_negative_are_unroutable() {
        let raw = vec![
            vec![0.0, f64::NAN, 1.0],
            vec![f64::NAN, 0.0, -2.0],
            vec![1.0, -2.0, 0.0],
        ];
        let matrix = CostMatrix::from_raw(raw).unwrap();
        assert!(!matrix.is_routable(0, 1));
        assert!(!matrix.is_routable(1, 2));
        assert_eq!(matrix.get(0, 2), 1.0);
        assert_eq!(matrix.isolated_location(), Some(1));
    }

    #[test]
    fn test_fully_unroutable_matrix() {
        let inf = f64::INFINITY;
        let matrix = CostMatrix::from_raw(vec![vec![0.0, inf], vec![inf, 0.0]]).unwrap();
        assert_eq!(matrix.max_finite(), None);
        assert_eq!(matrix.isolated_location(), Some(0));
    }

    #[test]
    fn test_single_location_skips_oracle() {
        let matrix = CostMatrix::build(&DownOracle, &coords(1)).unwrap();
        assert_eq!(matrix.size(), 1);
        assert_eq!(matrix.get(0, 0), 0.0);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let err = CostMatrix::build(&DownOracle, &[]).unwrap_err();
        assert_eq!(err, OptimizeError::InsufficientLocations(0));
    }

    #[test]
    fn test_oracle_failure_is_matrix_unavailable() {
        let err = CostMatrix::build(&DownOracle, &coords(3)).unwrap_err();
        assert!(matches!(err, OptimizeError::MatrixUnavailable(_)));
    }

    #[test]
    fn test_wrong_shape_is_matrix_unavailable() {
        let raw = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        let err = CostMatrix::build(&RawOracle(raw), &coords(3)).unwrap_err();
        assert!(matches!(err, OptimizeError::MatrixUnavailable(_)));

        let ragged = vec![vec![0.0, 1.0], vec![1.0]];
        assert!(CostMatrix::from_raw(ragged).is_err());
    }

    #[test]
    fn test_cycle_cost_includes_return_edge() {
        let raw = vec![
            vec![0.0, 1.0, 1.0],
            vec![1.0, 0.0, 1.4],
            vec![1.0, 1.4, 0.0],
        ];
        let matrix = CostMatrix::from_raw(raw).unwrap();
        assert!((matrix.cycle_cost(&[0, 1, 2]) - 3.4).abs() < 1e-9);
        assert_eq!(matrix.max_finite(), Some(1.4));
    }
}
