//! TSP as a quadratic unconstrained binary optimization problem.
//!
//! Variable `x[i, p]` is set when location `i` occupies tour position `p`.
//! The energy of an assignment is
//!
//! ```text
//! E(x) = Σ_{i≠j} Σ_p w_ij · x[i,p] · x[j,p+1 mod N]
//!      + P · Σ_i (Σ_p x[i,p] − 1)²
//!      + P · Σ_p (Σ_i x[i,p] − 1)²
//! ```
//!
//! so a valid permutation has energy equal to its cycle length and any
//! one-hot violation costs at least `P`.

use crate::error::{OptimizeError, Result};
use crate::matrix::CostMatrix;

/// Default penalty, relative to the largest normalized finite edge weight.
pub const DEFAULT_PENALTY_SCALE: f64 = 2.0;

#[derive(Debug, Clone)]
pub struct Qubo {
    locations: usize,
    linear: Vec<f64>,
    /// Symmetric, zero diagonal, row-major.
    coupling: Vec<f64>,
    offset: f64,
    /// Kilometers per energy unit.
    scale: f64,
}

impl Qubo {
    /// Builds the QUBO for the cycle over `matrix`.
    ///
    /// Weights are normalized so the largest finite edge is 1. Unroutable
    /// edges get a finite weight above any all-finite tour, which keeps the
    /// energy finite while ranking such tours last.
    pub fn from_matrix(matrix: &CostMatrix, penalty_scale: f64) -> Self {
        let n = matrix.size();
        let vars = n * n;
        let scale = matrix.max_finite().filter(|max| *max > 0.0).unwrap_or(1.0);
        let forbidden = n as f64 + 1.0;
        let penalty = penalty_scale;

        let mut qubo = Self {
            locations: n,
            linear: vec![0.0; vars],
            coupling: vec![0.0; vars * vars],
            offset: 0.0,
            scale,
        };

        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let cost = matrix.get(i, j);
                let weight = if cost.is_finite() { cost / scale } else { forbidden };
                for p in 0..n {
                    let a = qubo.variable(i, p);
                    let b = qubo.variable(j, (p + 1) % n);
                    qubo.add_coupling(a, b, weight);
                }
            }
        }

        for k in 0..n {
            let by_location: Vec<usize> = (0..n).map(|p| qubo.variable(k, p)).collect();
            let by_position: Vec<usize> = (0..n).map(|i| qubo.variable(i, k)).collect();
            qubo.add_one_hot(&by_location, penalty);
            qubo.add_one_hot(&by_position, penalty);
        }

        qubo
    }

    /// `P (Σ x − 1)²` expanded with `x² = x`.
    fn add_one_hot(&mut self, group: &[usize], penalty: f64) {
        self.offset += penalty;
        for (k, &a) in group.iter().enumerate() {
            self.linear[a] -= penalty;
            for &b in &group[k + 1..] {
                self.add_coupling(a, b, 2.0 * penalty);
            }
        }
    }

    fn add_coupling(&mut self, a: usize, b: usize, value: f64) {
        let m = self.num_variables();
        self.coupling[a * m + b] += value;
        self.coupling[b * m + a] += value;
    }

    pub fn num_variables(&self) -> usize {
        self.linear.len()
    }

    pub fn variable(&self, location: usize, position: usize) -> usize {
        location * self.locations + position
    }

    pub fn coupling_row(&self, a: usize) -> &[f64] {
        let m = self.num_variables();
        &self.coupling[a * m..(a + 1) * m]
    }

    pub fn energy(&self, bits: &[bool]) -> f64 {
        let m = self.num_variables();
        let mut energy = self.offset;
        for a in (0..m).filter(|&a| bits[a]) {
            energy += self.linear[a];
            let row = self.coupling_row(a);
            energy += ((a + 1)..m).filter(|&b| bits[b]).map(|b| row[b]).sum::<f64>();
        }
        energy
    }

    /// `h[a] = linear[a] + Σ_b J[a][b] x[b]`; flipping `a` changes the
    /// energy by `(1 − 2 x[a]) h[a]`.
    pub fn local_fields(&self, bits: &[bool]) -> Vec<f64> {
        (0..self.num_variables())
            .map(|a| {
                let row = self.coupling_row(a);
                self.linear[a] + (0..row.len()).filter(|&b| bits[b]).map(|b| row[b]).sum::<f64>()
            })
            .collect()
    }

    /// Converts an energy back into planning-matrix kilometers.
    pub fn to_km(&self, energy: f64) -> f64 {
        energy * self.scale
    }

    /// Reads the visiting order out of an assignment.
    ///
    /// Each position must hold exactly one location and each location must
    /// appear once.
    pub fn decode(&self, bits: &[bool]) -> Result<Vec<usize>> {
        let n = self.locations;
        if bits.len() != self.num_variables() {
            return Err(OptimizeError::invalid_decode(format!(
                "expected {} variables, got {}",
                self.num_variables(),
                bits.len()
            )));
        }

        let mut order = Vec::with_capacity(n);
        let mut placed = vec![false; n];
        for p in 0..n {
            let mut occupants = (0..n).filter(|&i| bits[self.variable(i, p)]);
            let location = match (occupants.next(), occupants.next()) {
                (Some(i), None) => i,
                (None, _) => {
                    return Err(OptimizeError::invalid_decode(format!("position {p} is empty")));
                }
                (Some(_), Some(_)) => {
                    return Err(OptimizeError::invalid_decode(format!(
                        "position {p} holds several locations"
                    )));
                }
            };
            if std::mem::replace(&mut placed[location], true) {
                return Err(OptimizeError::invalid_decode(format!(
                    "location {location} occupies several positions"
                )));
            }
            order.push(location);
        }
        Ok(order)
    }

    /// The assignment placing `order[p]` at position `p`.
    pub fn encode(&self, order: &[usize]) -> Vec<bool> {
        let mut bits = vec![false; self.num_variables()];
        for (p, &i) in order.iter().enumerate() {
            bits[self.variable(i, p)] = true;
        }
        bits
    }
}
