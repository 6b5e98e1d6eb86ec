/// IP geolocation client.
///
/// Resolves the caller's city from their public IP, ip-api style. Used
/// only at startup to pick the default subject when none is configured;
/// the polling loop itself never geolocates.
///
/// API documentation: https://ip-api.com/docs/api:json

use serde::Deserialize;

use crate::model::GatewayError;

// ---------------------------------------------------------------------------
// API response structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GeoResponse {
    status: String,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Blocking IP-geolocation client.
pub struct GeoClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl GeoClient {
    pub fn new(client: reqwest::blocking::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Looks up the caller's city.
    pub fn locate_city(&self) -> Result<String, GatewayError> {
        let response = self.client.get(&self.base_url).send().map_err(GatewayError::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::HttpStatus(status.as_u16()));
        }

        let body = response.text().map_err(GatewayError::from)?;
        parse_geo_response(&body)
    }
}

/// Parses an ip-api style response body into a city name.
///
/// The API signals failure in the body (`status: "fail"`) with a 200
/// status line, so the body is the failure contract here.
pub fn parse_geo_response(body: &str) -> Result<String, GatewayError> {
    let response: GeoResponse =
        serde_json::from_str(body).map_err(|e| GatewayError::Parse(e.to_string()))?;

    if response.status != "success" {
        let reason = response
            .message
            .unwrap_or_else(|| "geolocation lookup failed".to_string());
        return Err(GatewayError::LocationNotFound(reason));
    }

    response
        .city
        .filter(|city| !city.is_empty())
        .ok_or_else(|| GatewayError::NoData("geolocation response had no city".to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
