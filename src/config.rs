/// Daemon configuration.
///
/// Loaded once at startup from a TOML file (`airmon.toml` by default,
/// or the path in `AIRMON_CONFIG`). Every field has a compiled-in
/// default, and a missing file yields the default configuration, so a
/// bare checkout runs without any setup beyond the API key.
///
/// The OpenWeather API key deliberately lives in the environment
/// (`OPENWEATHER_API_KEY`, loaded via dotenv), not in this file.

use serde::Deserialize;
use std::path::Path;

use crate::alert::thresholds::ThresholdSet;
use crate::logging::LogLevel;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Subject city. When absent the geolocation gateway resolves it
    /// from the caller's IP at startup.
    pub city: Option<String>,
    /// Seconds between polling cycles.
    pub poll_interval_secs: u64,
    /// Append-only alert log path.
    pub alert_log: String,
    /// Optional service log file; console-only when absent.
    pub service_log: Option<String>,
    /// Minimum log level: "debug", "info", "warn" or "error".
    pub log_level: String,
    /// Current-conditions endpoint.
    pub weather_api_url: String,
    /// Air-pollution endpoint.
    pub air_quality_api_url: String,
    /// IP geolocation endpoint.
    pub geo_api_url: String,
    /// Forecasting model predict endpoint. Forecasting is disabled
    /// when absent.
    pub model_api_url: Option<String>,
    /// Alert trigger table.
    pub thresholds: ThresholdSet,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            city: None,
            poll_interval_secs: 10,
            alert_log: "alerts.log".to_string(),
            service_log: None,
            log_level: "info".to_string(),
            weather_api_url: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            air_quality_api_url: "https://api.openweathermap.org/data/2.5/air_pollution"
                .to_string(),
            geo_api_url: "http://ip-api.com/json/".to_string(),
            model_api_url: None,
            thresholds: ThresholdSet::default(),
        }
    }
}

impl Config {
    /// Parses the configured log level, falling back to Info on an
    /// unrecognized value rather than refusing to start.
    pub fn min_log_level(&self) -> LogLevel {
        match self.log_level.to_ascii_lowercase().as_str() {
            "debug" => LogLevel::Debug,
            "warn" | "warning" => LogLevel::Warning,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Errors raised while loading the configuration file.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config file: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Loads configuration from `path`.
///
/// A missing file is not an error, defaults apply. An unreadable or
/// unparseable file is, since silently ignoring a present-but-broken
/// config would mask operator mistakes.
pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Config::default());
        }
        Err(e) => return Err(ConfigError::Io(e)),
    };
    toml::from_str(&contents).map_err(ConfigError::Parse)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.poll_interval_secs, 10);
        assert_eq!(config.alert_log, "alerts.log");
        assert!(config.city.is_none());
        assert!(config.model_api_url.is_none());
        assert_eq!(config.min_log_level(), LogLevel::Info);
    }

    #[test]
    fn test_full_document_parses() {
        let doc = r#"
            city = "Springfield"
            poll_interval_secs = 60
            alert_log = "/var/log/airmon/alerts.log"
            service_log = "/var/log/airmon/service.log"
            log_level = "debug"
            model_api_url = "http://localhost:8501/v1/models/pollution_forecasting:predict"

            [thresholds.weather]
            temperature = 32.0

            [thresholds.air_quality]
            pm2_5 = 25.0
            o3 = 80.0
        "#;
        let config: Config = toml::from_str(doc).expect("valid config TOML");
        assert_eq!(config.city.as_deref(), Some("Springfield"));
        assert_eq!(config.poll_interval_secs, 60);
        assert_eq!(config.min_log_level(), LogLevel::Debug);
        assert_eq!(config.thresholds.weather.temperature, 32.0);
        assert_eq!(config.thresholds.weather.humidity, 50.0);
        assert_eq!(config.thresholds.air_quality.len(), 2);
        assert!(config.model_api_url.is_some());
    }

    #[test]
    fn test_unrecognized_log_level_falls_back_to_info() {
        let config: Config = toml::from_str("log_level = \"loud\"").expect("parses");
        assert_eq!(config.min_log_level(), LogLevel::Info);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = load("/nonexistent/airmon.toml").expect("missing file is not an error");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_broken_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("airmon_cfg_{}.toml", std::process::id()));
        std::fs::write(&path, "city = [unclosed").expect("write scratch config");
        let result = load(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
        std::fs::remove_file(&path).ok();
    }
}
