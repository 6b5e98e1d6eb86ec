//! Daemon entry point.
//!
//! Usage: `airmon_service [--verify] [CITY]`
//!
//! Resolves the subject (CLI argument, then config file, then IP
//! geolocation), optionally verifies the configured gateways, then
//! starts background notifications and parks until the process is
//! terminated.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use airmon_service::alert::sink::AlertLog;
use airmon_service::config;
use airmon_service::forecast::ForecastClient;
use airmon_service::ingest::air_quality::OpenAirQualityClient;
use airmon_service::ingest::geo::GeoClient;
use airmon_service::ingest::weather::OpenWeatherClient;
use airmon_service::ingest::{self, WeatherProvider};
use airmon_service::logging::{self, LogSource};
use airmon_service::notify::Notifier;
use airmon_service::verify;

fn main() {
    dotenv::dotenv().ok();

    let mut verify_mode = false;
    let mut city_arg: Option<String> = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--verify" => verify_mode = true,
            other => city_arg = Some(other.to_string()),
        }
    }

    let config_path =
        std::env::var("AIRMON_CONFIG").unwrap_or_else(|_| "airmon.toml".to_string());
    let config = match config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    logging::init_logger(config.min_log_level(), config.service_log.as_deref());

    let api_key = match std::env::var("OPENWEATHER_API_KEY") {
        Ok(key) => key,
        Err(_) => {
            eprintln!("OPENWEATHER_API_KEY is not set (put it in .env or the environment)");
            std::process::exit(1);
        }
    };

    let http = match ingest::http_client() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let weather =
        OpenWeatherClient::new(http.clone(), config.weather_api_url.as_str(), api_key.as_str());
    let air_quality = OpenAirQualityClient::new(
        http.clone(),
        config.air_quality_api_url.as_str(),
        api_key.as_str(),
    );
    let forecast = config
        .model_api_url
        .as_ref()
        .map(|url| ForecastClient::new(http.clone(), url.as_str()));

    // Subject resolution: CLI argument beats config beats geolocation.
    let subject = match city_arg.or_else(|| config.city.clone()) {
        Some(city) => city,
        None => {
            let geo = GeoClient::new(http.clone(), config.geo_api_url.as_str());
            match geo.locate_city() {
                Ok(city) => {
                    logging::info(
                        LogSource::Geo,
                        Some(&city),
                        "subject resolved from IP geolocation",
                    );
                    city
                }
                Err(e) => {
                    eprintln!("Could not determine your location: {}", e);
                    eprintln!("Pass a city name or set `city` in {}", config_path);
                    std::process::exit(1);
                }
            }
        }
    };

    if verify_mode {
        let report = verify::run_verification(&subject, &weather, &air_quality, forecast.as_ref());
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to serialize verification report: {}", e);
                std::process::exit(1);
            }
        }
        std::process::exit(if report.summary.gateways_failed == 0 { 0 } else { 1 });
    }

    // One-shot forecast summary before the polling loop takes over.
    if let Some(forecast) = &forecast {
        match weather.current(&subject) {
            Ok(reading) => match forecast.predict(reading.coord) {
                Ok(report) => {
                    for p in &report.pollutants {
                        logging::info(
                            LogSource::Forecast,
                            Some(&subject),
                            &format!("{}: {} µg/m³ ({})", p.pollutant, p.value, p.category),
                        );
                    }
                }
                Err(e) => logging::log_gateway_failure(
                    LogSource::Forecast,
                    Some(&subject),
                    "startup forecast",
                    &e,
                ),
            },
            Err(e) => logging::log_gateway_failure(
                LogSource::Weather,
                Some(&subject),
                "startup forecast coordinates",
                &e,
            ),
        }
    }

    let notifier = Notifier::new(
        Arc::new(weather),
        Arc::new(air_quality),
        config.thresholds.clone(),
        AlertLog::new(&config.alert_log),
        Duration::from_secs(config.poll_interval_secs),
    );
    notifier.start(&subject);
    logging::info(
        LogSource::System,
        Some(&subject),
        &format!(
            "polling every {}s, alerts appended to {}",
            config.poll_interval_secs, config.alert_log
        ),
    );

    // The poller runs for the life of the process; termination is via
    // process shutdown.
    loop {
        thread::park();
    }
}
