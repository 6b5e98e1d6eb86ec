//! Gateway Verification Module
//!
//! Probes the configured gateways for one subject to determine which
//! are accessible and returning usable data. Run via `--verify` before
//! leaving a deployment unattended. A daemon that starts cleanly but
//! logs a failed cycle every ten seconds helps nobody.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::forecast::{ForecastClient, PollutantForecast};
use crate::ingest::{AirQualityProvider, WeatherProvider};
use crate::model::ALL_POLLUTANTS;

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub timestamp: String,
    pub subject: String,
    pub weather: WeatherVerification,
    pub air_quality: AirQualityVerification,
    pub forecast: ForecastVerification,
    pub summary: VerificationSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub gateways_probed: usize,
    pub gateways_working: usize,
    pub gateways_failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherVerification {
    pub status: VerificationStatus,
    pub resolved_city: Option<String>,
    pub fields_present: Vec<String>,
    pub fields_missing: Vec<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirQualityVerification {
    pub status: VerificationStatus,
    pub pollutants_present: Vec<String>,
    pub pollutants_missing: Vec<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastVerification {
    pub status: VerificationStatus,
    pub breakdown: Option<Vec<PollutantForecast>>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum VerificationStatus {
    Success,
    PartialSuccess,
    Failed,
    /// Gateway not configured; nothing to probe.
    Skipped,
}

// ============================================================================
// Per-gateway probes
// ============================================================================

pub fn verify_weather(
    provider: &dyn WeatherProvider,
    subject: &str,
) -> (WeatherVerification, Option<crate::model::Coordinates>) {
    match provider.current(subject) {
        Ok(reading) => {
            let mut present = Vec::new();
            let mut missing = Vec::new();
            for (field, value) in [
                ("temperature", reading.temperature),
                ("humidity", reading.humidity),
                ("wind_speed", reading.wind_speed),
            ] {
                if value.is_some() {
                    present.push(field.to_string());
                } else {
                    missing.push(field.to_string());
                }
            }
            let status = if missing.is_empty() {
                VerificationStatus::Success
            } else {
                VerificationStatus::PartialSuccess
            };
            let coord = reading.coord;
            (
                WeatherVerification {
                    status,
                    resolved_city: Some(reading.city),
                    fields_present: present,
                    fields_missing: missing,
                    error_message: None,
                },
                Some(coord),
            )
        }
        Err(e) => (
            WeatherVerification {
                status: VerificationStatus::Failed,
                resolved_city: None,
                fields_present: Vec::new(),
                fields_missing: Vec::new(),
                error_message: Some(e.to_string()),
            },
            None,
        ),
    }
}

pub fn verify_air_quality(
    provider: &dyn AirQualityProvider,
    coord: Option<crate::model::Coordinates>,
) -> AirQualityVerification {
    let Some(coord) = coord else {
        return AirQualityVerification {
            status: VerificationStatus::Failed,
            pollutants_present: Vec::new(),
            pollutants_missing: Vec::new(),
            error_message: Some(
                "coordinates unavailable (weather gateway failed)".to_string(),
            ),
        };
    };

    match provider.current(coord) {
        Ok(reading) => {
            let mut present = Vec::new();
            let mut missing = Vec::new();
            for key in ALL_POLLUTANTS {
                if reading.concentrations.contains_key(*key) {
                    present.push((*key).to_string());
                } else {
                    missing.push((*key).to_string());
                }
            }
            let status = if missing.is_empty() {
                VerificationStatus::Success
            } else if present.is_empty() {
                VerificationStatus::Failed
            } else {
                VerificationStatus::PartialSuccess
            };
            AirQualityVerification {
                status,
                pollutants_present: present,
                pollutants_missing: missing,
                error_message: None,
            }
        }
        Err(e) => AirQualityVerification {
            status: VerificationStatus::Failed,
            pollutants_present: Vec::new(),
            pollutants_missing: Vec::new(),
            error_message: Some(e.to_string()),
        },
    }
}

pub fn verify_forecast(
    client: Option<&ForecastClient>,
    coord: Option<crate::model::Coordinates>,
) -> ForecastVerification {
    let Some(client) = client else {
        return ForecastVerification {
            status: VerificationStatus::Skipped,
            breakdown: None,
            error_message: None,
        };
    };
    let Some(coord) = coord else {
        return ForecastVerification {
            status: VerificationStatus::Failed,
            breakdown: None,
            error_message: Some(
                "coordinates unavailable (weather gateway failed)".to_string(),
            ),
        };
    };

    match client.predict(coord) {
        Ok(report) => ForecastVerification {
            status: VerificationStatus::Success,
            breakdown: Some(report.pollutants),
            error_message: None,
        },
        Err(e) => ForecastVerification {
            status: VerificationStatus::Failed,
            breakdown: None,
            error_message: Some(e.to_string()),
        },
    }
}

// ============================================================================
// Report assembly
// ============================================================================

/// Probes all gateways for `subject` and assembles the report.
///
/// The air-quality and forecast probes key off the coordinates the
/// weather probe resolved, mirroring the polling cycle's data flow.
pub fn run_verification(
    subject: &str,
    weather: &dyn WeatherProvider,
    air_quality: &dyn AirQualityProvider,
    forecast: Option<&ForecastClient>,
) -> VerificationReport {
    let (weather_result, coord) = verify_weather(weather, subject);
    let air_result = verify_air_quality(air_quality, coord);
    let forecast_result = verify_forecast(forecast, coord);

    let statuses = [
        weather_result.status,
        air_result.status,
        forecast_result.status,
    ];
    let probed = statuses
        .iter()
        .filter(|s| **s != VerificationStatus::Skipped)
        .count();
    let working = statuses
        .iter()
        .filter(|s| {
            matches!(
                s,
                VerificationStatus::Success | VerificationStatus::PartialSuccess
            )
        })
        .count();

    VerificationReport {
        timestamp: Utc::now().to_rfc3339(),
        subject: subject.to_string(),
        weather: weather_result,
        air_quality: air_result,
        forecast: forecast_result,
        summary: VerificationSummary {
            gateways_probed: probed,
            gateways_working: working,
            gateways_failed: probed - working,
        },
    }
}

// ============================================================================
// Tests
// ============================================================================
