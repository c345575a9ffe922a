//! OpenRouteService HTTP adapter for road distances and geocoding.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::OracleError;
use crate::location::{Coordinate, Location};
use crate::traits::{DistanceOracle, Geocoder};

#[derive(Debug, Clone)]
pub struct OrsConfig {
    pub base_url: String,
    pub api_key: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl OrsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: "https://api.openrouteservice.org".to_string(),
            api_key: api_key.into(),
            profile: "driving-car".to_string(),
            timeout_secs: 10,
        }
    }

    /// Reads `ORS_API_KEY` (required) plus the optional `ORS_BASE_URL`,
    /// `ORS_PROFILE` and `ORS_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, OracleError> {
        let api_key = env::var("ORS_API_KEY")
            .map_err(|_| OracleError::Config("ORS_API_KEY is not set".to_string()))?;
        let mut config = Self::new(api_key);
        if let Ok(base_url) = env::var("ORS_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(profile) = env::var("ORS_PROFILE") {
            config.profile = profile;
        }
        if let Ok(timeout) = env::var("ORS_TIMEOUT_SECS") {
            config.timeout_secs = timeout
                .parse()
                .map_err(|_| OracleError::Config(format!("invalid ORS_TIMEOUT_SECS: {timeout}")))?;
        }
        Ok(config)
    }
}

#[derive(Debug, Clone)]
pub struct OrsClient {
    config: OrsConfig,
    client: reqwest::blocking::Client,
}

impl OrsClient {
    pub fn new(config: OrsConfig) -> Result<Self, OracleError> {
        if config.api_key.is_empty() {
            return Err(OracleError::Config("ORS api key is empty".to_string()));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

impl DistanceOracle for OrsClient {
    fn distance_matrix(&self, coords: &[Coordinate]) -> Result<Vec<Vec<f64>>, OracleError> {
        if coords.is_empty() {
            return Ok(Vec::new());
        }

        let request = MatrixRequest {
            locations: coords.iter().map(|c| [c.lon, c.lat]).collect(),
            metrics: ["distance"],
            units: "m",
        };
        let body: MatrixResponse = self
            .client
            .post(self.url(&format!("/v2/matrix/{}", self.config.profile)))
            .header(reqwest::header::AUTHORIZATION, self.config.api_key.as_str())
            .json(&request)
            .send()?
            .error_for_status()?
            .json()?;

        let distances = body
            .distances
            .ok_or_else(|| OracleError::invalid_response("ORS matrix has no distances"))?;

        Ok(distances
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|meters| meters.map_or(f64::INFINITY, |m| m / 1000.0))
                    .collect()
            })
            .collect())
    }

    fn route_distance(&self, from: Coordinate, to: Coordinate) -> Result<f64, OracleError> {
        let request = DirectionsRequest {
            coordinates: [[from.lon, from.lat], [to.lon, to.lat]],
            // -1 lets the service snap to the nearest road at any distance
            radiuses: [-1.0, -1.0],
        };
        let response = self
            .client
            .post(self.url(&format!("/v2/directions/{}", self.config.profile)))
            .header(reqwest::header::AUTHORIZATION, self.config.api_key.as_str())
            .json(&request)
            .send()?;

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "ORS directions request rejected");
            return Err(OracleError::NoRoute);
        }

        let body: DirectionsResponse = response.json()?;
        body.routes
            .first()
            .map(|route| route.summary.distance / 1000.0)
            .ok_or(OracleError::NoRoute)
    }
}

impl Geocoder for OrsClient {
    fn resolve(&self, query: &str) -> Result<Option<Location>, OracleError> {
        let body: GeocodeResponse = self
            .client
            .get(self.url("/geocode/search"))
            .header(reqwest::header::AUTHORIZATION, self.config.api_key.as_str())
            .query(&[("text", query), ("size", "1")])
            .send()?
            .error_for_status()?
            .json()?;

        Ok(body.features.first().map(|feature| {
            let [lon, lat] = feature.geometry.coordinates;
            Location::new(query, lon, lat)
        }))
    }
}

#[derive(Debug, Serialize)]
struct MatrixRequest {
    locations: Vec<[f64; 2]>,
    metrics: [&'static str; 1],
    units: &'static str,
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    distances: Option<Vec<Vec<Option<f64>>>>,
}

#[derive(Debug, Serialize)]
struct DirectionsRequest {
    coordinates: [[f64; 2]; 2],
    radiuses: [f64; 2],
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    summary: RouteSummary,
}

#[derive(Debug, Deserialize)]
struct RouteSummary {
    #[serde(default)]
    distance: f64,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    features: Vec<GeocodeFeature>,
}

#[derive(Debug, Deserialize)]
struct GeocodeFeature {
    geometry: GeocodeGeometry,
}

#[derive(Debug, Deserialize)]
struct GeocodeGeometry {
    coordinates: [f64; 2],
}
