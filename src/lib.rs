//! tour-planner: visiting-order optimization over real road distances.
//!
//! Builds a symmetric cost matrix from a distance oracle, solves the
//! travelling-salesperson cycle with a nearest-neighbor heuristic or a
//! variational QUBO sampler, and reports a tour whose length is re-measured
//! leg by leg through the oracle.

pub mod error;
pub mod haversine;
pub mod location;
pub mod matrix;
pub mod metrics;
pub mod ors;
pub mod osrm;
pub mod qubo;
pub mod report;
pub mod solver;
pub mod tour;
pub mod traits;
pub mod variational;

pub use error::{OptimizeError, OracleError};
pub use location::{Coordinate, Location};
pub use solver::{SolveOptions, SolveResult, Strategy, baseline, optimize, optimize_with};
