//! OSRM HTTP adapter for road distances.

use std::env;
use std::time::Duration;

use serde::Deserialize;

use crate::error::OracleError;
use crate::location::Coordinate;
use crate::traits::DistanceOracle;

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
    /// Snapping radius for point-to-point queries, in meters.
    pub snap_radius_m: f64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 10,
            snap_radius_m: 5_000.0,
        }
    }
}

impl OsrmConfig {
    /// Reads `OSRM_BASE_URL`, `OSRM_PROFILE` and `OSRM_TIMEOUT_SECS`,
    /// falling back to defaults for unset variables.
    pub fn from_env() -> Result<Self, OracleError> {
        let mut config = Self::default();
        if let Ok(base_url) = env::var("OSRM_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(profile) = env::var("OSRM_PROFILE") {
            config.profile = profile;
        }
        if let Ok(timeout) = env::var("OSRM_TIMEOUT_SECS") {
            config.timeout_secs = timeout
                .parse()
                .map_err(|_| OracleError::Config(format!("invalid OSRM_TIMEOUT_SECS: {timeout}")))?;
        }
        Ok(config)
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, OracleError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn url(&self, service: &str, coords: &[Coordinate]) -> String {
        let coords = coords
            .iter()
            .map(|c| format!("{:.6},{:.6}", c.lon, c.lat))
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/{}/v1/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            service,
            self.config.profile,
            coords
        )
    }
}

impl DistanceOracle for OsrmClient {
    fn distance_matrix(&self, coords: &[Coordinate]) -> Result<Vec<Vec<f64>>, OracleError> {
        if coords.is_empty() {
            return Ok(Vec::new());
        }

        let body: OsrmTableResponse = self
            .client
            .get(self.url("table", coords))
            .query(&[("annotations", "distance")])
            .send()?
            .error_for_status()?
            .json()?;

        if body.code != "Ok" {
            return Err(OracleError::invalid_response(format!("OSRM table returned {}", body.code)));
        }

        let distances = body
            .distances
            .ok_or_else(|| OracleError::invalid_response("OSRM table has no distances"))?;

        Ok(distances
            .into_iter()
            .map(|row| row.into_iter().map(meters_to_km).collect())
            .collect())
    }

    fn route_distance(&self, from: Coordinate, to: Coordinate) -> Result<f64, OracleError> {
        let radius = format!("{0:.0};{0:.0}", self.config.snap_radius_m);
        let body: OsrmRouteResponse = self
            .client
            .get(self.url("route", &[from, to]))
            .query(&[("overview", "false"), ("radiuses", radius.as_str())])
            .send()?
            .json()?;

        if body.code != "Ok" {
            return Err(OracleError::NoRoute);
        }

        body.routes
            .first()
            .map(|route| route.distance / 1000.0)
            .ok_or(OracleError::NoRoute)
    }
}

fn meters_to_km(meters: Option<f64>) -> f64 {
    meters.map_or(f64::INFINITY, |m| m / 1000.0)
}

#[derive(Debug, Deserialize)]
struct OsrmTableResponse {
    code: String,
    distances: Option<Vec<Vec<Option<f64>>>>,
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
}
