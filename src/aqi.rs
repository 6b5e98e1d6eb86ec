/// Air-quality category classification.
///
/// Maps a pollutant concentration to a qualitative category via ordered
/// breakpoints. The same breakpoint table applies to every supported
/// pollutant (pm2_5, pm10, co, no2, o3, so2), so the classifier takes
/// only the concentration.

use serde::{Deserialize, Serialize};

/// Air-quality categories, in ascending order of severity.
///
/// The derived `Ord` follows declaration order, so severity comparisons
/// (`Category::Unhealthy > Category::Moderate`) behave as expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl Category {
    /// Human-readable label, as presented to users and written to logs.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Good => "Good",
            Category::Moderate => "Moderate",
            Category::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            Category::Unhealthy => "Unhealthy",
            Category::VeryUnhealthy => "Very Unhealthy",
            Category::Hazardous => "Hazardous",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Classifies a concentration (µg/m³) into a `Category`.
///
/// Breakpoints are applied in strictly ascending order; the first one
/// the value does not exceed determines the category. A value above the
/// highest breakpoint (250.4) is `Hazardous`.
///
/// Defined for any numeric input. Callers must clamp negative or
/// missing values to 0 before classification; see
/// [`classify_clamped`] for the clamping variant used on forecast
/// output.
pub fn classify(concentration: f64) -> Category {
    if concentration <= 12.0 {
        Category::Good
    } else if concentration <= 35.4 {
        Category::Moderate
    } else if concentration <= 55.4 {
        Category::UnhealthyForSensitiveGroups
    } else if concentration <= 150.4 {
        Category::Unhealthy
    } else if concentration <= 250.4 {
        Category::VeryUnhealthy
    } else {
        Category::Hazardous
    }
}

/// Clamps a possibly-negative estimate to 0, then classifies it.
///
/// Forecast models can emit small negative concentrations; those are
/// treated as 0 rather than classified raw.
pub fn classify_clamped(concentration: f64) -> (f64, Category) {
    let clamped = concentration.max(0.0);
    (clamped, classify(clamped))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
