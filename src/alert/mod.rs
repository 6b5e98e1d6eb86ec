/// Threshold alerting for weather and air-quality readings.
///
/// Submodules:
/// - `thresholds` — the configured trigger values per measurement key.
/// - `evaluator` — the pure reading-vs-threshold check.
/// - `sink` — the append-only alert log.

pub mod evaluator;
pub mod sink;
pub mod thresholds;
