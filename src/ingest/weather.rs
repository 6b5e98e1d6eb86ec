/// Current-conditions client for the OpenWeather API.
///
/// Retrieves current weather by city name (metric units). The response
/// also carries the coordinates the provider resolved the city to,
/// which key the subsequent air-quality and forecast lookups.
///
/// API documentation: https://openweathermap.org/current

use chrono::Utc;
use serde::Deserialize;

use crate::ingest::WeatherProvider;
use crate::model::{Coordinates, GatewayError, WeatherReading};

// ---------------------------------------------------------------------------
// API response structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    coord: CoordSection,
    main: MainSection,
    #[serde(default)]
    wind: Option<WindSection>,
    name: String,
}

#[derive(Debug, Deserialize)]
struct CoordSection {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct MainSection {
    temp: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WindSection {
    speed: Option<f64>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Blocking OpenWeather current-conditions client.
pub struct OpenWeatherClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn new(
        client: reqwest::blocking::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn fetch(&self, city: &str) -> Result<WeatherReading, GatewayError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", city), ("appid", &self.api_key), ("units", "metric")])
            .send()
            .map_err(GatewayError::from)?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(GatewayError::LocationNotFound(city.to_string()));
        }
        if !status.is_success() {
            return Err(GatewayError::HttpStatus(status.as_u16()));
        }

        let body = response.text().map_err(GatewayError::from)?;
        parse_current_response(&body)
    }
}

impl WeatherProvider for OpenWeatherClient {
    fn current(&self, city: &str) -> Result<WeatherReading, GatewayError> {
        self.fetch(city)
    }
}

/// Parses a current-conditions response body into a reading.
///
/// Separated from the HTTP call so decoding is testable against canned
/// payloads.
pub fn parse_current_response(body: &str) -> Result<WeatherReading, GatewayError> {
    let response: CurrentResponse =
        serde_json::from_str(body).map_err(|e| GatewayError::Parse(e.to_string()))?;

    Ok(WeatherReading {
        city: response.name,
        coord: Coordinates {
            latitude: response.coord.lat,
            longitude: response.coord.lon,
        },
        temperature: response.main.temp,
        humidity: response.main.humidity,
        wind_speed: response.wind.and_then(|w| w.speed),
        retrieved_at: Utc::now(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
