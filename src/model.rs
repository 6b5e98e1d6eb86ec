/// Core data types for the air monitoring service.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O and no gateway-specific structures, only the types
/// that flow between components, plus the gateway error taxonomy.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

// ---------------------------------------------------------------------------
// Pollutant keys
// ---------------------------------------------------------------------------

/// Pollutant identifier for fine particulate matter (≤ 2.5 µm).
pub const POLLUTANT_PM2_5: &str = "pm2_5";

/// Pollutant identifier for coarse particulate matter (≤ 10 µm).
pub const POLLUTANT_PM10: &str = "pm10";

/// Pollutant identifier for carbon monoxide.
pub const POLLUTANT_CO: &str = "co";

/// Pollutant identifier for nitrogen dioxide.
pub const POLLUTANT_NO2: &str = "no2";

/// Pollutant identifier for sulphur dioxide.
pub const POLLUTANT_SO2: &str = "so2";

/// Pollutant identifier for ozone.
pub const POLLUTANT_O3: &str = "o3";

/// All pollutant keys carried by air-quality readings.
pub const ALL_POLLUTANTS: &[&str] = &[
    POLLUTANT_PM2_5,
    POLLUTANT_PM10,
    POLLUTANT_CO,
    POLLUTANT_NO2,
    POLLUTANT_SO2,
    POLLUTANT_O3,
];

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// A WGS84 latitude/longitude pair.
///
/// Resolved by the weather gateway and used to key the air-quality and
/// forecast lookups.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4},{:.4}", self.latitude, self.longitude)
    }
}

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// A snapshot of current weather conditions for one subject.
///
/// Produced fresh on every weather gateway call; immutable once
/// constructed. Measurements are optional: a provider may omit any of
/// them, and absent values are defaulted to 0 at evaluation time, not
/// here.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReading {
    /// Resolved subject name, e.g. "Springfield".
    pub city: String,
    /// Coordinates the provider resolved the subject to.
    pub coord: Coordinates,
    /// Temperature in degrees Celsius.
    pub temperature: Option<f64>,
    /// Relative humidity as a percentage (0–100).
    pub humidity: Option<f64>,
    /// Wind speed in m/s.
    pub wind_speed: Option<f64>,
    /// Time the reading was retrieved.
    pub retrieved_at: DateTime<Utc>,
}

/// A snapshot of pollutant concentrations for one coordinate pair.
///
/// Concentrations are in µg/m³, keyed by the `POLLUTANT_*` identifiers.
/// The map preserves insertion order so downstream iteration is stable.
#[derive(Debug, Clone, PartialEq)]
pub struct AirQualityReading {
    pub coord: Coordinates,
    pub concentrations: IndexMap<String, f64>,
    pub retrieved_at: DateTime<Utc>,
}

impl AirQualityReading {
    /// Concentration for `key`, defaulting to 0 when the provider
    /// omitted it. Missing measurements never trigger alerts.
    pub fn concentration(&self, key: &str) -> f64 {
        self.concentrations.get(key).copied().unwrap_or(0.0)
    }
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

/// A single threshold breach for one measurement.
///
/// Ephemeral: produced per evaluation cycle, printed and appended to
/// the alert log, never retained in memory between cycles.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    /// Measurement key that breached, e.g. "temperature" or "pm2_5".
    pub measurement: String,
    /// Observed value at evaluation time.
    pub value: f64,
    /// Human-readable alert line.
    pub message: String,
}

impl std::fmt::Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when calling an external gateway.
#[derive(Debug, PartialEq)]
pub enum GatewayError {
    /// Non-2xx HTTP response from a gateway.
    HttpStatus(u16),
    /// The request could not be sent or the connection failed.
    Transport(String),
    /// The response body could not be deserialized.
    Parse(String),
    /// The requested subject could not be resolved to a location.
    LocationNotFound(String),
    /// The gateway answered but carried no usable data.
    NoData(String),
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayError::HttpStatus(code) => write!(f, "HTTP error: {}", code),
            GatewayError::Transport(msg) => write!(f, "Transport error: {}", msg),
            GatewayError::Parse(msg) => write!(f, "Parse error: {}", msg),
            GatewayError::LocationNotFound(subject) => {
                write!(f, "Location not found: {}", subject)
            }
            GatewayError::NoData(what) => write!(f, "No data available: {}", what),
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            GatewayError::HttpStatus(status.as_u16())
        } else if err.is_decode() {
            GatewayError::Parse(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
