/// Structured logging for the air monitoring service
///
/// Provides context-rich logging with gateway source tags, subject
/// identifiers, timestamps, and severity levels. Supports both console
/// output and file-based logging for daemon operations.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::model::GatewayError;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Log Sources
// ---------------------------------------------------------------------------

/// Which component produced a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    Weather,
    AirQuality,
    Geo,
    Forecast,
    System,
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogSource::Weather => write!(f, "WEATHER"),
            LogSource::AirQuality => write!(f, "AIRQ"),
            LogSource::Geo => write!(f, "GEO"),
            LogSource::Forecast => write!(f, "FORECAST"),
            LogSource::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - subject unresolvable or provider has no data
    Expected,
    /// Unexpected failure - indicates service degradation or a broken contract
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>) {
        let logger = Logger {
            min_level,
            log_file,
        };

        *LOGGER.lock().unwrap() = Some(logger);
    }

    fn log(&self, level: LogLevel, source: LogSource, subject: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let subject_part = subject.map(|s| format!(" [{}]", s)).unwrap_or_default();
        let log_entry = format!(
            "{} {} {}{}: {}",
            timestamp, level, source, subject_part, message
        );

        match level {
            LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
            LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>) {
    Logger::init(min_level, log_file.map(String::from));
}

/// Log a general informational message
pub fn info(source: LogSource, subject: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Info, source, subject, message);
    }
}

/// Log a warning message
pub fn warn(source: LogSource, subject: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Warning, source, subject, message);
    }
}

/// Log an error message
pub fn error(source: LogSource, subject: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Error, source, subject, message);
    }
}

/// Log a debug message
pub fn debug(source: LogSource, subject: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Debug, source, subject, message);
    }
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a gateway failure based on the error variant.
///
/// An unresolvable subject or an empty payload is a fact about the
/// world, not about this service; transport and decode problems point
/// at degradation on one side of the wire.
pub fn classify_gateway_failure(err: &GatewayError) -> FailureType {
    match err {
        GatewayError::LocationNotFound(_) => FailureType::Expected,
        GatewayError::NoData(_) => FailureType::Unknown,
        GatewayError::HttpStatus(code) if *code >= 500 => FailureType::Unexpected,
        GatewayError::HttpStatus(_) => FailureType::Unknown,
        GatewayError::Transport(_) => FailureType::Unexpected,
        GatewayError::Parse(_) => FailureType::Unexpected,
    }
}

/// Log a gateway failure with automatic classification.
///
/// Expected failures log at debug, unexpected at error, unknown at
/// warning. The classification picks how loud a failed cycle is.
pub fn log_gateway_failure(
    source: LogSource,
    subject: Option<&str>,
    operation: &str,
    err: &GatewayError,
) {
    let failure_type = classify_gateway_failure(err);
    let message = format!("{} failed [{}]: {}", operation, failure_type, err);

    match failure_type {
        FailureType::Expected => debug(source, subject, &message),
        FailureType::Unexpected => error(source, subject, &message),
        FailureType::Unknown => warn(source, subject, &message),
    }
}
