/// Reading-vs-threshold evaluation.
///
/// `check_alerts` is a pure function of its arguments: no I/O, no
/// hidden state, no ordering dependency between measurement keys.
/// Printing and alert-log persistence belong to the caller (the
/// notification loop), invoked once per non-empty batch.

use crate::alert::thresholds::ThresholdSet;
use crate::model::{AirQualityReading, Alert, WeatherReading};

/// Checks both readings against the threshold set and returns the
/// triggered alerts.
///
/// A measurement triggers when its observed value is greater than or
/// equal to its configured threshold (inclusive boundary). Measurements
/// the provider omitted are treated as 0 and so never trigger.
///
/// Output order is fixed: temperature, humidity, wind speed, then the
/// air-quality keys in the threshold set's iteration order.
pub fn check_alerts(
    weather: &WeatherReading,
    air: &AirQualityReading,
    thresholds: &ThresholdSet,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    let temperature = weather.temperature.unwrap_or(0.0);
    if temperature >= thresholds.weather.temperature {
        alerts.push(Alert {
            measurement: "temperature".to_string(),
            value: temperature,
            message: format!("High Temperature Alert: {}°C!", temperature),
        });
    }

    let humidity = weather.humidity.unwrap_or(0.0);
    if humidity >= thresholds.weather.humidity {
        alerts.push(Alert {
            measurement: "humidity".to_string(),
            value: humidity,
            message: format!("High Humidity Alert: {}%!", humidity),
        });
    }

    let wind_speed = weather.wind_speed.unwrap_or(0.0);
    if wind_speed >= thresholds.weather.wind_speed {
        alerts.push(Alert {
            measurement: "wind_speed".to_string(),
            value: wind_speed,
            message: format!("High Wind Speed Alert: {} m/s!", wind_speed),
        });
    }

    for (key, threshold) in &thresholds.air_quality {
        let value = air.concentration(key);
        if value >= *threshold {
            alerts.push(Alert {
                measurement: key.clone(),
                value,
                message: format!("High {} Alert: {} µg/m³!", pollutant_label(key), value),
            });
        }
    }

    alerts
}

/// Presentation name for a pollutant key.
fn pollutant_label(key: &str) -> String {
    match key {
        "pm2_5" => "PM2.5".to_string(),
        "pm10" => "PM10".to_string(),
        _ => key.to_uppercase(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coordinates;
    use chrono::{TimeZone, Utc};
    use indexmap::IndexMap;

    fn coord() -> Coordinates {
        Coordinates {
            latitude: 39.7817,
            longitude: -89.6501,
        }
    }

    /// A fixed retrieval time; evaluation must not depend on it.
    fn retrieved() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 14, 9, 30, 0).unwrap()
    }

    fn weather(temp: Option<f64>, humidity: Option<f64>, wind: Option<f64>) -> WeatherReading {
        WeatherReading {
            city: "Springfield".to_string(),
            coord: coord(),
            temperature: temp,
            humidity,
            wind_speed: wind,
            retrieved_at: retrieved(),
        }
    }

    fn air(pairs: &[(&str, f64)]) -> AirQualityReading {
        let mut concentrations = IndexMap::new();
        for (key, value) in pairs {
            concentrations.insert((*key).to_string(), *value);
        }
        AirQualityReading {
            coord: coord(),
            concentrations,
            retrieved_at: retrieved(),
        }
    }

    // --- Inclusive boundary -------------------------------------------------

    #[test]
    fn test_temperature_at_threshold_triggers_exactly_one_alert() {
        // Default temperature threshold is 35, inclusive.
        let alerts = check_alerts(
            &weather(Some(35.0), Some(10.0), Some(0.0)),
            &air(&[]),
            &ThresholdSet::default(),
        );
        assert_eq!(alerts.len(), 1, "expected only the temperature alert, got {:?}", alerts);
        assert_eq!(alerts[0].measurement, "temperature");
        assert_eq!(alerts[0].message, "High Temperature Alert: 35°C!");
    }

    #[test]
    fn test_temperature_just_below_threshold_does_not_trigger() {
        let alerts = check_alerts(
            &weather(Some(34.9), Some(10.0), Some(0.0)),
            &air(&[]),
            &ThresholdSet::default(),
        );
        assert!(
            alerts.iter().all(|a| a.measurement != "temperature"),
            "34.9 must not trigger the 35 threshold: {:?}",
            alerts
        );
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_pollutant_at_threshold_triggers() {
        // pm2_5 default threshold is 35, inclusive like the weather group.
        let alerts = check_alerts(
            &weather(Some(20.0), Some(10.0), Some(2.0)),
            &air(&[("pm2_5", 35.0)]),
            &ThresholdSet::default(),
        );
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].measurement, "pm2_5");
        assert_eq!(alerts[0].message, "High PM2.5 Alert: 35 µg/m³!");
    }

    // --- Missing measurements -----------------------------------------------

    #[test]
    fn test_missing_weather_fields_never_trigger() {
        let alerts = check_alerts(
            &weather(None, None, None),
            &air(&[]),
            &ThresholdSet::default(),
        );
        assert!(alerts.is_empty(), "absent measurements default to 0: {:?}", alerts);
    }

    #[test]
    fn test_configured_pollutant_missing_from_reading_never_alerts() {
        // Every default pollutant threshold is configured, but the
        // reading only carries ozone; the rest default to 0 silently.
        let alerts = check_alerts(
            &weather(Some(20.0), Some(10.0), Some(2.0)),
            &air(&[("o3", 120.0)]),
            &ThresholdSet::default(),
        );
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].measurement, "o3");
    }

    // --- Ordering -----------------------------------------------------------

    #[test]
    fn test_alert_order_is_weather_then_air_in_threshold_order() {
        let mut thresholds = ThresholdSet::default();
        thresholds.air_quality.clear();
        thresholds.air_quality.insert("so2".to_string(), 5.0);
        thresholds.air_quality.insert("pm10".to_string(), 5.0);

        let alerts = check_alerts(
            &weather(Some(40.0), Some(90.0), Some(20.0)),
            &air(&[("pm10", 80.0), ("so2", 30.0)]),
            &thresholds,
        );
        let order: Vec<_> = alerts.iter().map(|a| a.measurement.as_str()).collect();
        assert_eq!(
            order,
            vec!["temperature", "humidity", "wind_speed", "so2", "pm10"],
            "weather fields come first in fixed order, then threshold-set order"
        );
    }

    // --- Purity -------------------------------------------------------------

    #[test]
    fn test_evaluation_is_pure() {
        let w = weather(Some(36.0), Some(55.0), Some(16.0));
        let a = air(&[("pm2_5", 40.0)]);
        let thresholds = ThresholdSet::default();
        let first = check_alerts(&w, &a, &thresholds);
        let second = check_alerts(&w, &a, &thresholds);
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn test_float_values_format_without_trailing_zeros() {
        let alerts = check_alerts(
            &weather(Some(36.5), Some(0.0), Some(0.0)),
            &air(&[]),
            &ThresholdSet::default(),
        );
        assert_eq!(alerts[0].message, "High Temperature Alert: 36.5°C!");
    }
}
