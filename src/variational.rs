//! Variational sampler over the TSP QUBO.
//!
//! A parameterized sampler draws assignments from the QUBO; a classical
//! derivative-free loop tunes its parameters to lower the mean sampled
//! energy. The lowest-energy assignment seen during the whole search is
//! decoded into a tour.
//!
//! Each layer has two parameters: an inverse temperature `gamma` for
//! Metropolis sweeps and a mixing rate `beta`, the probability that a
//! variable is proposed for a flip during a sweep. Every shot starts from
//! uniformly random bits, runs the layers in order and ends with a
//! zero-temperature quench so samples settle into local minima.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::error::{OptimizeError, Result};
use crate::matrix::CostMatrix;
use crate::qubo::{DEFAULT_PENALTY_SCALE, Qubo};
use crate::traits::{Candidate, TourOptimizer};

/// Upper bound of the inverse temperature.
const GAMMA_MAX: f64 = 8.0;
/// Lower bound of the mixing rate; zero would freeze the sampler.
const BETA_MIN: f64 = 0.05;

/// Default location limit. The dense QUBO holds `N⁴` couplings and every
/// sweep touches all of them.
pub const MAX_QUBO_LOCATIONS: usize = 20;

/// Variational sampler configuration.
#[derive(Debug, Clone)]
pub struct VariationalConfig {
    /// Budget of objective evaluations for the parameter search.
    pub max_evaluations: usize,
    /// Number of parameterized layers.
    pub layers: usize,
    /// Samples drawn per objective evaluation.
    pub shots: usize,
    /// Metropolis sweeps per layer.
    pub sweeps_per_layer: usize,
    /// Constraint penalty relative to the largest normalized edge weight.
    pub penalty_scale: f64,
    /// Initial trust radius of the parameter search, in unit parameter space.
    pub initial_rho: f64,
    /// The search stops once the trust radius falls below this.
    pub final_rho: f64,
    /// Random seed; `None` draws a fresh one per run.
    pub seed: Option<u64>,
    /// Larger problems are rejected before the QUBO is built.
    pub max_locations: usize,
}

impl Default for VariationalConfig {
    fn default() -> Self {
        Self {
            max_evaluations: 50,
            layers: 1,
            shots: 64,
            sweeps_per_layer: 10,
            penalty_scale: DEFAULT_PENALTY_SCALE,
            initial_rho: 0.25,
            final_rho: 1e-3,
            seed: None,
            max_locations: MAX_QUBO_LOCATIONS,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VariationalOptimizer {
    config: VariationalConfig,
}

impl VariationalOptimizer {
    pub fn new(config: VariationalConfig) -> Self {
        Self { config }
    }
}

impl TourOptimizer for VariationalOptimizer {
    fn optimize(&self, matrix: &CostMatrix) -> Result<Candidate> {
        let n = matrix.size();
        if n < 2 {
            return Ok(Candidate {
                permutation: (0..n).collect(),
                objective: 0.0,
            });
        }
        if n > self.config.max_locations {
            return Err(OptimizeError::ProblemTooLarge {
                size: n,
                limit: self.config.max_locations,
            });
        }

        let qubo = Qubo::from_matrix(matrix, self.config.penalty_scale);
        let seed = self.config.seed.unwrap_or_else(rand::random);
        let mut search = Search {
            qubo: &qubo,
            config: &self.config,
            seed,
            evaluations: 0,
            best: None,
        };

        let initial = [0.25, 0.5].repeat(self.config.layers.max(1));
        let params = search.minimize(initial);

        let evaluations = search.evaluations;
        let best = search
            .best
            .ok_or_else(|| OptimizeError::invalid_decode("sampler produced no samples"))?;
        tracing::debug!(
            locations = n,
            evaluations,
            energy = best.energy,
            ?params,
            "variational search finished"
        );

        let permutation = qubo.decode(&best.bits)?;
        Ok(Candidate {
            permutation,
            objective: qubo.to_km(best.energy),
        })
    }

    fn name(&self) -> &str {
        "variational-qubo"
    }
}

#[derive(Debug, Clone)]
struct Sample {
    bits: Vec<bool>,
    energy: f64,
}

struct Search<'a> {
    qubo: &'a Qubo,
    config: &'a VariationalConfig,
    seed: u64,
    evaluations: usize,
    best: Option<Sample>,
}

impl Search<'_> {
    /// Compass search with a shrinking trust radius, bounded by the
    /// evaluation budget. Parameters live in the unit box.
    fn minimize(&mut self, mut params: Vec<f64>) -> Vec<f64> {
        let budget = self.config.max_evaluations.max(1);
        let mut value = self.evaluate(&params);
        let mut rho = self.config.initial_rho;

        while self.evaluations < budget && rho > self.config.final_rho {
            let mut improved = false;

            'directions: for d in 0..params.len() {
                for step in [rho, -rho] {
                    if self.evaluations >= budget {
                        break 'directions;
                    }
                    let mut trial = params.clone();
                    trial[d] = (trial[d] + step).clamp(0.0, 1.0);
                    if trial[d] == params[d] {
                        continue;
                    }
                    let trial_value = self.evaluate(&trial);
                    if trial_value < value {
                        params = trial;
                        value = trial_value;
                        improved = true;
                        break;
                    }
                }
            }

            if !improved {
                rho /= 2.0;
            }
        }

        params
    }

    /// Mean energy of one batch of shots at `params`.
    fn evaluate(&mut self, params: &[f64]) -> f64 {
        self.evaluations += 1;
        let layers: Vec<(f64, f64)> = params
            .chunks(2)
            .map(|pair| (pair[0] * GAMMA_MAX, BETA_MIN + (1.0 - BETA_MIN) * pair[1]))
            .collect();

        let qubo = self.qubo;
        let sweeps = self.config.sweeps_per_layer;
        let seed = self.seed;
        let samples: Vec<Sample> = (0..self.config.shots.max(1))
            .into_par_iter()
            .map(|shot| draw(qubo, &layers, sweeps, shot_seed(seed, shot)))
            .collect();

        let mean = samples.iter().map(|s| s.energy).sum::<f64>() / samples.len() as f64;
        tracing::trace!(evaluation = self.evaluations, ?layers, mean, "sampled batch");

        for sample in samples {
            let better = self.best.as_ref().is_none_or(|best| sample.energy < best.energy);
            if better {
                self.best = Some(sample);
            }
        }

        mean
    }
}

/// One shot: random start, Metropolis sweeps per layer, then a quench.
fn draw(qubo: &Qubo, layers: &[(f64, f64)], sweeps: usize, seed: u64) -> Sample {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let m = qubo.num_variables();
    let mut bits: Vec<bool> = (0..m).map(|_| rng.gen_bool(0.5)).collect();
    let mut fields = qubo.local_fields(&bits);

    for &(gamma, beta) in layers {
        for _ in 0..sweeps {
            for a in 0..m {
                if !rng.gen_bool(beta) {
                    continue;
                }
                let delta = flip_delta(&bits, &fields, a);
                let accept = delta <= 0.0 || rng.gen_range(0.0..1.0) < (-gamma * delta).exp();
                if accept {
                    flip(qubo, &mut bits, &mut fields, a);
                }
            }
        }
    }

    // Every accepted flip lowers the energy, so this terminates.
    loop {
        let mut improved = false;
        for a in 0..m {
            if flip_delta(&bits, &fields, a) < -1e-12 {
                flip(qubo, &mut bits, &mut fields, a);
                improved = true;
            }
        }
        if !improved {
            break;
        }
    }

    let energy = qubo.energy(&bits);
    Sample { bits, energy }
}

fn flip_delta(bits: &[bool], fields: &[f64], a: usize) -> f64 {
    if bits[a] { -fields[a] } else { fields[a] }
}

fn flip(qubo: &Qubo, bits: &mut [bool], fields: &mut [f64], a: usize) {
    let change = if bits[a] { -1.0 } else { 1.0 };
    bits[a] = !bits[a];
    for (field, coupling) in fields.iter_mut().zip(qubo.coupling_row(a)) {
        *field += coupling * change;
    }
}

/// SplitMix64 of the run seed and shot index. Shot seeds are shared across
/// evaluations, so parameter comparisons see common random numbers.
fn shot_seed(seed: u64, shot: usize) -> u64 {
    let mut z = seed.wrapping_add((shot as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
