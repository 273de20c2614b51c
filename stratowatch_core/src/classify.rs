//! Threshold classifiers for derived telemetry metrics.
//!
//! Three independent, pure bucketing functions, each total over its numeric
//! domain. Thresholds follow the feed producer's conventions (EPA AQI bands,
//! 50/150 km/h speed bands, 5/10 km vertical separation bands).
//!
//! NaN handling is deliberate: every comparison chain is written so a NaN
//! input falls through to the final branch. Callers that must not classify
//! garbage (e.g. a missing aircraft altitude) guard before calling.

use serde::{Deserialize, Serialize};

// ============================================================================
// SPEED
// ============================================================================

/// Ground-speed band of a tracked balloon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedBucket {
    Low,
    Medium,
    High,
}

/// Classifies a ground speed in km/h.
///
/// `<50` low, `[50, 150]` medium, `>150` high. NaN classifies as `High`.
pub fn speed_bucket(kmh: f64) -> SpeedBucket {
    if kmh < 50.0 {
        SpeedBucket::Low
    } else if kmh <= 150.0 {
        SpeedBucket::Medium
    } else {
        SpeedBucket::High
    }
}

// ============================================================================
// AIR QUALITY
// ============================================================================

/// EPA air-quality index band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AqiBucket {
    Good,
    Moderate,
    UnhealthySensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiBucket {
    /// Human-readable band label, as shown in marker popups.
    pub fn label(&self) -> &'static str {
        match self {
            AqiBucket::Good => "Good",
            AqiBucket::Moderate => "Moderate",
            AqiBucket::UnhealthySensitive => "Unhealthy for Sensitive Groups",
            AqiBucket::Unhealthy => "Unhealthy",
            AqiBucket::VeryUnhealthy => "Very Unhealthy",
            AqiBucket::Hazardous => "Hazardous",
        }
    }

    /// Display color for the band (EPA palette).
    pub fn color(&self) -> &'static str {
        match self {
            AqiBucket::Good => "#00E400",
            AqiBucket::Moderate => "#FFFF00",
            AqiBucket::UnhealthySensitive => "#FF7E00",
            AqiBucket::Unhealthy => "#FF0000",
            AqiBucket::VeryUnhealthy => "#8F3F97",
            AqiBucket::Hazardous => "#7E0023",
        }
    }
}

/// Classifies an air-quality index value.
///
/// Upper bounds are inclusive for each band; `>300` (and NaN) is hazardous.
pub fn aqi_bucket(aqi: f64) -> AqiBucket {
    if aqi <= 50.0 {
        AqiBucket::Good
    } else if aqi <= 100.0 {
        AqiBucket::Moderate
    } else if aqi <= 150.0 {
        AqiBucket::UnhealthySensitive
    } else if aqi <= 200.0 {
        AqiBucket::Unhealthy
    } else if aqi <= 300.0 {
        AqiBucket::VeryUnhealthy
    } else {
        AqiBucket::Hazardous
    }
}

// ============================================================================
// ALTITUDE SEPARATION
// ============================================================================

/// Vertical-separation band between a balloon and an aircraft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeparationBand {
    Critical,
    Warning,
    Good,
}

/// Classifies the vertical separation between a balloon and an aircraft.
///
/// `|diff| < 5000 m` critical, `< 10000 m` warning, else good. NaN in either
/// altitude classifies as `Good`; callers with no aircraft altitude at all
/// must not call (guard on non-empty aircraft data).
pub fn separation_band(balloon_altitude_m: f64, aircraft_altitude_m: f64) -> SeparationBand {
    let diff = (balloon_altitude_m - aircraft_altitude_m).abs();
    if diff < 5_000.0 {
        SeparationBand::Critical
    } else if diff < 10_000.0 {
        SeparationBand::Warning
    } else {
        SeparationBand::Good
    }
}
