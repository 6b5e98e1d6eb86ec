/// Air-pollution client for the OpenWeather API.
///
/// Retrieves current pollutant concentrations (µg/m³) by latitude and
/// longitude. The response carries more species than this service
/// tracks; decoding keeps only the six monitored pollutants, in the
/// canonical key order.
///
/// API documentation: https://openweathermap.org/api/air-pollution

use chrono::Utc;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::ingest::AirQualityProvider;
use crate::model::{
    AirQualityReading, Coordinates, GatewayError, POLLUTANT_CO, POLLUTANT_NO2, POLLUTANT_O3,
    POLLUTANT_PM10, POLLUTANT_PM2_5, POLLUTANT_SO2,
};

// ---------------------------------------------------------------------------
// API response structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PollutionResponse {
    list: Vec<PollutionEntry>,
}

#[derive(Debug, Deserialize)]
struct PollutionEntry {
    components: Components,
}

#[derive(Debug, Deserialize)]
struct Components {
    pm2_5: Option<f64>,
    pm10: Option<f64>,
    co: Option<f64>,
    no2: Option<f64>,
    so2: Option<f64>,
    o3: Option<f64>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Blocking OpenWeather air-pollution client.
pub struct OpenAirQualityClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl OpenAirQualityClient {
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

    fn fetch(&self, coord: Coordinates) -> Result<AirQualityReading, GatewayError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", coord.latitude.to_string()),
                ("lon", coord.longitude.to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .map_err(GatewayError::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::HttpStatus(status.as_u16()));
        }

        let body = response.text().map_err(GatewayError::from)?;
        parse_pollution_response(&body, coord)
    }
}

impl AirQualityProvider for OpenAirQualityClient {
    fn current(&self, coord: Coordinates) -> Result<AirQualityReading, GatewayError> {
        self.fetch(coord)
    }
}

/// Parses an air-pollution response body into a reading.
///
/// The `list` array carries one entry for a current-conditions request;
/// an empty array means the provider has no data for the coordinates.
pub fn parse_pollution_response(
    body: &str,
    coord: Coordinates,
) -> Result<AirQualityReading, GatewayError> {
    let response: PollutionResponse =
        serde_json::from_str(body).map_err(|e| GatewayError::Parse(e.to_string()))?;

    let entry = response
        .list
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::NoData(format!("no pollution entry for {}", coord)))?;

    let c = entry.components;
    let mut concentrations = IndexMap::new();
    for (key, value) in [
        (POLLUTANT_PM2_5, c.pm2_5),
        (POLLUTANT_PM10, c.pm10),
        (POLLUTANT_CO, c.co),
        (POLLUTANT_NO2, c.no2),
        (POLLUTANT_SO2, c.so2),
        (POLLUTANT_O3, c.o3),
    ] {
        if let Some(value) = value {
            concentrations.insert(key.to_string(), value);
        }
    }

    Ok(AirQualityReading {
        coord,
        concentrations,
        retrieved_at: Utc::now(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
