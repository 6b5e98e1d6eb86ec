/// Pollution-forecasting model gateway.
///
/// The trained model is an opaque external predictor served behind a
/// TF-Serving-style HTTP endpoint. This module encodes a coordinate
/// pair into the fixed-shape input the model expects, decodes the six
/// concentration estimates it returns, and classifies each estimate
/// standalone.
///
/// Model contract:
/// - input: one 1×10 row per instance, latitude in slot 0, longitude
///   in slot 1, remaining slots zero
/// - output: six concentrations, in order pm2_5, pm10, co, no2, so2, o3

use serde::{Deserialize, Serialize};

use crate::aqi::{self, Category};
use crate::model::{Coordinates, GatewayError};

/// Width of one model input row.
pub const MODEL_INPUT_WIDTH: usize = 10;

/// Model output order. Distinct from the canonical reading order, which
/// ends no2/so2 the other way around.
pub const MODEL_OUTPUT_ORDER: &[&str] = &["pm2_5", "pm10", "co", "no2", "so2", "o3"];

// ---------------------------------------------------------------------------
// Wire structures
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<Vec<Vec<f64>>>,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    predictions: Vec<Vec<f64>>,
}

// ---------------------------------------------------------------------------
// Forecast results
// ---------------------------------------------------------------------------

/// One forecasted pollutant: the (clamped) estimate and its category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollutantForecast {
    pub pollutant: String,
    pub value: f64,
    pub category: Category,
}

/// Forecasted breakdown for one coordinate pair, in model output order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    pub latitude: f64,
    pub longitude: f64,
    pub pollutants: Vec<PollutantForecast>,
}

// ---------------------------------------------------------------------------
// Encoding / decoding
// ---------------------------------------------------------------------------

/// Encodes a coordinate pair into the model's 1×1×10 input tensor.
pub fn encode_input(coord: Coordinates) -> Vec<Vec<Vec<f64>>> {
    let mut row = vec![0.0; MODEL_INPUT_WIDTH];
    row[0] = coord.latitude;
    row[1] = coord.longitude;
    vec![vec![row]]
}

/// Decodes a prediction row into a forecast report.
///
/// Estimates can come back slightly negative; each is clamped to 0
/// before classification rather than classified raw.
pub fn decode_prediction(coord: Coordinates, row: &[f64]) -> Result<ForecastReport, GatewayError> {
    if row.len() < MODEL_OUTPUT_ORDER.len() {
        return Err(GatewayError::Parse(format!(
            "prediction row has {} values, expected {}",
            row.len(),
            MODEL_OUTPUT_ORDER.len()
        )));
    }

    let pollutants = MODEL_OUTPUT_ORDER
        .iter()
        .zip(row.iter())
        .map(|(pollutant, estimate)| {
            let (value, category) = aqi::classify_clamped(*estimate);
            PollutantForecast {
                pollutant: (*pollutant).to_string(),
                value,
                category,
            }
        })
        .collect();

    Ok(ForecastReport {
        latitude: coord.latitude,
        longitude: coord.longitude,
        pollutants,
    })
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Blocking client for the model's predict endpoint.
pub struct ForecastClient {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl ForecastClient {
    pub fn new(client: reqwest::blocking::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Requests a pollutant forecast for one coordinate pair.
    pub fn predict(&self, coord: Coordinates) -> Result<ForecastReport, GatewayError> {
        let request = PredictRequest {
            instances: encode_input(coord),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(GatewayError::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::HttpStatus(status.as_u16()));
        }

        let decoded: PredictResponse = response
            .json()
            .map_err(|e| GatewayError::Parse(e.to_string()))?;

        let row = decoded
            .predictions
            .first()
            .ok_or_else(|| GatewayError::NoData(format!("no prediction for {}", coord)))?;

        decode_prediction(coord, row)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
