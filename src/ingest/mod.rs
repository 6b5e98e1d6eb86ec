/// External data gateways.
///
/// Each gateway is a single blocking request/response call against a
/// third-party HTTP API, treated as a black box. The notification loop
/// consumes the weather and air-quality gateways through the traits
/// below so tests can substitute fakes; the concrete clients live in
/// the submodules.
///
/// Submodules:
/// - `weather` — current conditions by city name.
/// - `air_quality` — pollutant concentrations by coordinates.
/// - `geo` — IP-based city lookup for the default subject.

use std::time::Duration;

use crate::model::{AirQualityReading, Coordinates, GatewayError, WeatherReading};

pub mod air_quality;
pub mod geo;
pub mod weather;

/// A type that can fetch current weather conditions for a subject.
pub trait WeatherProvider: Send + Sync {
    fn current(&self, city: &str) -> Result<WeatherReading, GatewayError>;
}

/// A type that can fetch current pollutant concentrations for a
/// coordinate pair.
pub trait AirQualityProvider: Send + Sync {
    fn current(&self, coord: Coordinates) -> Result<AirQualityReading, GatewayError>;
}

/// Builds the shared blocking HTTP client used by every gateway.
///
/// The 10 second timeout is defensive: the upstream behavior has none,
/// but a hung gateway call would stall the polling thread for an
/// entire cycle otherwise.
pub fn http_client() -> Result<reqwest::blocking::Client, GatewayError> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .map_err(GatewayError::from)
}
