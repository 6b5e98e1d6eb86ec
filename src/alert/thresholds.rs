/// Alert threshold configuration.
///
/// A `ThresholdSet` is loaded once at process start (compiled-in
/// defaults, optionally overridden from the TOML config file) and never
/// mutated afterwards. It is partitioned into a weather group with
/// fixed, named fields and an air-quality group keyed by pollutant.
///
/// Thresholds are inclusive: a measurement equal to its trigger value
/// alerts. This is deliberately the opposite boundary convention from
/// the classifier's `<=` breakpoints; the two tables are independent
/// pieces of configuration.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::model::{
    POLLUTANT_CO, POLLUTANT_NO2, POLLUTANT_O3, POLLUTANT_PM10, POLLUTANT_PM2_5, POLLUTANT_SO2,
};

// ---------------------------------------------------------------------------
// Weather thresholds
// ---------------------------------------------------------------------------

/// Trigger values for the weather measurements, each inclusive.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WeatherThresholds {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
    /// Metres per second.
    pub wind_speed: f64,
}

impl Default for WeatherThresholds {
    fn default() -> Self {
        Self {
            temperature: 35.0,
            humidity: 50.0,
            wind_speed: 15.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Threshold set
// ---------------------------------------------------------------------------

/// The full trigger table: weather group plus air-quality group.
///
/// The air-quality group is an ordered map; evaluation iterates it in
/// insertion order (document order when loaded from TOML), which fixes
/// the presentation order of air-quality alerts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ThresholdSet {
    pub weather: WeatherThresholds,
    pub air_quality: IndexMap<String, f64>,
}

impl Default for ThresholdSet {
    fn default() -> Self {
        Self {
            weather: WeatherThresholds::default(),
            air_quality: default_air_quality_thresholds(),
        }
    }
}

/// Default air-quality triggers, µg/m³ per pollutant.
fn default_air_quality_thresholds() -> IndexMap<String, f64> {
    let mut table = IndexMap::new();
    table.insert(POLLUTANT_PM2_5.to_string(), 35.0);
    table.insert(POLLUTANT_PM10.to_string(), 50.0);
    table.insert(POLLUTANT_CO.to_string(), 10.0);
    table.insert(POLLUTANT_O3.to_string(), 100.0);
    table.insert(POLLUTANT_NO2.to_string(), 40.0);
    table.insert(POLLUTANT_SO2.to_string(), 20.0);
    table
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
