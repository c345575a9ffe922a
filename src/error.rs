//! Error types for the optimization engine and its distance oracles.

use thiserror::Error;

/// Failures surfaced by the optimization pipeline.
///
/// Every variant rejects the whole optimization; the engine never returns a
/// partial tour or a non-finite cost.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizeError {
    /// The routing service could not produce a distance matrix at all.
    #[error("distance matrix unavailable: {0}")]
    MatrixUnavailable(String),
    /// Nearest-neighbor construction reached a location with no routable
    /// unvisited neighbour.
    #[error("no feasible path from location index {from}")]
    NoFeasiblePath { from: usize },
    /// The approximate optimizer did not produce a valid permutation.
    #[error("optimizer result is not a valid tour: {0}")]
    InvalidDecode(String),
    /// A leg of an otherwise valid tour has no real-world route.
    #[error("no route between `{from}` and `{to}`")]
    UnroutableSegment { from: String, to: String },
    /// The requested start location does not exist.
    #[error("anchor index {anchor} is out of range for {size} locations")]
    InvalidAnchor { anchor: usize, size: usize },
    /// Fewer than two distinct resolvable locations were supplied.
    #[error("at least 2 distinct locations are required, got {0}")]
    InsufficientLocations(usize),
    /// The geocoder found no match for a place name.
    #[error("could not find coordinates for `{0}`")]
    LocationNotFound(String),
    /// The geocoder itself failed.
    #[error("geocoding failed: {0}")]
    Geocoding(String),
    /// Too many locations for the configured optimizer.
    #[error("{size} locations exceed the optimizer limit of {limit}")]
    ProblemTooLarge { size: usize, limit: usize },
}

pub type Result<T> = std::result::Result<T, OptimizeError>;

impl OptimizeError {
    pub fn matrix_unavailable(message: impl Into<String>) -> Self {
        Self::MatrixUnavailable(message.into())
    }

    pub fn invalid_decode(message: impl Into<String>) -> Self {
        Self::InvalidDecode(message.into())
    }
}

/// Failures of a single lookup against a routing or geocoding service.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("no route found")]
    NoRoute,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl OracleError {
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }
}
