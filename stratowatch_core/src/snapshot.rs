//! Wire data model for the inbound snapshot feed, plus the single-slot cache.
//!
//! A `Snapshot` is the atomic unit exchanged with the feed: once parsed and
//! validated it is immutable, and every derived structure (constellation,
//! overlays, summaries) is recomputed from it rather than patched in place.
//! Validation happens entirely at parse time, so the index-alignment
//! invariant between `path` and `velocities` holds by construction
//! everywhere downstream.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Feed-assigned identifier of a tracked balloon.
pub type BalloonId = u32;

// ============================================================================
// TRACKED OBJECTS
// ============================================================================

/// One tracked balloon as delivered by the feed.
///
/// `path` is most-recent-first; `path[0]` is the current position. The
/// `velocities` sequence is index-aligned with `path` (speed in km/h,
/// heading in degrees). An empty `path` means the balloon has no fix yet;
/// such balloons are excluded from rendering and statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balloon {
    /// Feed-assigned id
    pub id: BalloonId,

    /// Historical positions, most recent first, each `[latitude, longitude]`
    #[serde(default)]
    pub path: Vec<[f64; 2]>,

    /// Velocity samples aligned with `path`, each `[speed_kmh, heading_deg]`
    #[serde(default)]
    pub velocities: Vec<[f64; 2]>,
}

impl Balloon {
    /// Current position, if the balloon has a fix.
    pub fn current_position(&self) -> Option<[f64; 2]> {
        self.path.first().copied()
    }

    /// Current `(speed_kmh, heading_deg)` sample, if present.
    pub fn current_velocity(&self) -> Option<(f64, f64)> {
        self.velocities.first().map(|v| (v[0], v[1]))
    }

    /// A balloon is active when it has at least one position fix.
    pub fn is_active(&self) -> bool {
        !self.path.is_empty()
    }
}

// ============================================================================
// SECONDARY LAYER RECORDS
// ============================================================================

/// Averaged reading for a single pollutant at one measurement site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollutantReading {
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub unit: String,
}

/// Air-quality record for one balloon position, keyed by balloon id.
///
/// The AQI itself is computed upstream; this engine only re-derives the
/// display band (see `classify::aqi_bucket`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AirQualityReading {
    #[serde(default)]
    pub aqi: f64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub measurement_count: u32,
    /// Pollutant readings keyed by parameter name (`pm25`, `pm10`, `o3`, ...)
    #[serde(default)]
    pub pollutants: BTreeMap<String, PollutantReading>,
}

impl AirQualityReading {
    /// Value of a named pollutant, if reported.
    pub fn pollutant(&self, name: &str) -> Option<f64> {
        self.pollutants.get(name).map(|p| p.value)
    }
}

/// Weather record for one balloon position, keyed by balloon id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeatherReading {
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub apparent_temperature: f64,
    #[serde(default)]
    pub pressure: f64,
    #[serde(default)]
    pub humidity: f64,
    #[serde(default)]
    pub wind_speed: f64,
    #[serde(default)]
    pub wind_direction: f64,
    #[serde(default)]
    pub wind_gusts: f64,
    #[serde(default)]
    pub cloud_cover: f64,
    #[serde(default)]
    pub precipitation: f64,
    #[serde(default)]
    pub weather_description: String,
}

/// One aircraft state vector from the air-traffic layer.
///
/// Aircraft are an independent list (not keyed by balloon id); they are
/// matched to balloons upstream by proximity, and this engine consumes the
/// resulting safety analysis rather than re-deriving it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Aircraft {
    #[serde(default)]
    pub icao24: String,
    #[serde(default)]
    pub callsign: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Barometric altitude in meters
    #[serde(default)]
    pub altitude: Option<f64>,
    /// Geometric altitude in meters, fallback when barometric is absent
    #[serde(default)]
    pub geo_altitude: Option<f64>,
    #[serde(default)]
    pub velocity: Option<f64>,
    #[serde(default)]
    pub true_track: Option<f64>,
    #[serde(default)]
    pub on_ground: bool,
}

impl Aircraft {
    /// Best available altitude (barometric preferred, geometric fallback).
    pub fn best_altitude(&self) -> Option<f64> {
        self.altitude.or(self.geo_altitude)
    }

    /// Position as `(lat, lon)` when both coordinates are present.
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

// ============================================================================
// SAFETY ANALYSIS (consumed, never re-derived)
// ============================================================================

/// One balloon/aircraft encounter, pre-classified by the feed producer.
///
/// The risk tier is fixed by which list the encounter appears in; this
/// engine only re-derives the altitude-separation *display* band.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskEncounter {
    #[serde(default)]
    pub balloon_id: BalloonId,
    #[serde(default)]
    pub aircraft_callsign: String,
    #[serde(default)]
    pub horizontal_distance: f64,
    #[serde(default)]
    pub vertical_distance: f64,
    #[serde(default)]
    pub aircraft_altitude: f64,
    #[serde(default)]
    pub balloon_altitude: f64,
}

/// Pre-computed safety analysis from the air-traffic layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SafetyAnalysis {
    #[serde(default)]
    pub total_aircraft: u32,
    #[serde(default)]
    pub near_misses: Vec<RiskEncounter>,
    #[serde(default)]
    pub high_risk_encounters: Vec<RiskEncounter>,
    #[serde(default)]
    pub medium_risk_encounters: Vec<RiskEncounter>,
    #[serde(default)]
    pub low_risk_encounters: Vec<RiskEncounter>,
    #[serde(default)]
    pub safety_zones_violated: u32,
    #[serde(default)]
    pub altitude_conflicts: u32,
}

// ============================================================================
// PRE-AGGREGATED INSIGHTS
// ============================================================================

/// Speed-bucket counts as reported (or recomputed, see `summary`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedDistribution {
    #[serde(default)]
    pub low: u32,
    #[serde(default)]
    pub medium: u32,
    #[serde(default)]
    pub high: u32,
}

/// Hemisphere counts around the constellation centroid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeographicSpread {
    #[serde(default)]
    pub north: u32,
    #[serde(default)]
    pub south: u32,
    #[serde(default)]
    pub east: u32,
    #[serde(default)]
    pub west: u32,
}

/// Pre-aggregated summary fields from the feed, displayable as-is or
/// recomputed locally for cross-validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedInsights {
    #[serde(default)]
    pub total_balloons: u32,
    #[serde(default)]
    pub active_balloons: u32,
    #[serde(default)]
    pub avg_speed: f64,
    #[serde(default)]
    pub speed_distribution: SpeedDistribution,
    #[serde(default)]
    pub geographic_spread: GeographicSpread,
    #[serde(default)]
    pub constellation_links: u32,
}

// ============================================================================
// SNAPSHOT
// ============================================================================

/// One immutable, atomically-applied payload from the inbound feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Feed timestamp (ISO-8601 string, displayed verbatim)
    pub last_updated: String,

    /// All tracked balloons
    pub balloons: Vec<Balloon>,

    /// Proximity links as index pairs, possibly server-precomputed.
    /// Absent means "recompute locally".
    #[serde(default)]
    pub constellation: Option<Vec<[usize; 2]>>,

    /// Air-quality layer, keyed by balloon id
    #[serde(default)]
    pub air_quality: BTreeMap<BalloonId, AirQualityReading>,

    /// Weather layer, keyed by balloon id
    #[serde(default)]
    pub weather: BTreeMap<BalloonId, WeatherReading>,

    /// Aircraft layer (independent list)
    #[serde(default)]
    pub aircraft: Vec<Aircraft>,

    /// Pre-computed balloon/aircraft safety analysis
    #[serde(default)]
    pub safety_analysis: Option<SafetyAnalysis>,

    /// Pre-aggregated summary fields
    #[serde(default)]
    pub insights: Option<FeedInsights>,
}

impl Snapshot {
    /// Parses and validates a raw feed document.
    ///
    /// The snapshot is rejected in its entirety on any failure; there is
    /// no partial apply.
    pub fn from_value(value: serde_json::Value) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot =
            serde_json::from_value(value).map_err(|e| SnapshotError::Malformed(e.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    fn validate(&self) -> Result<(), SnapshotError> {
        for balloon in &self.balloons {
            if balloon.path.len() != balloon.velocities.len() {
                return Err(SnapshotError::MisalignedTrack(balloon.id));
            }
        }
        if let Some(links) = &self.constellation {
            let n = self.balloons.len();
            for link in links {
                if link[0] >= n || link[1] >= n {
                    return Err(SnapshotError::LinkOutOfRange(link[0].max(link[1])));
                }
            }
        }
        Ok(())
    }

    /// Balloons with at least one position fix.
    pub fn active_balloons(&self) -> impl Iterator<Item = &Balloon> {
        self.balloons.iter().filter(|b| b.is_active())
    }
}

/// Errors that can occur while parsing or validating a snapshot.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SnapshotError {
    #[error("Malformed snapshot: {0}")]
    Malformed(String),

    #[error("Balloon {0}: path and velocities are not index-aligned")]
    MisalignedTrack(BalloonId),

    #[error("Constellation link index {0} out of range")]
    LinkOutOfRange(usize),
}

// ============================================================================
// SNAPSHOT CACHE
// ============================================================================

/// Read view of the cache slot: an explicit empty-state marker rather than
/// a bare `Option` at call sites that must render a "no data yet" state.
#[derive(Debug)]
pub enum CacheRead<'a> {
    /// No snapshot has been applied yet
    Empty,
    /// The last successfully applied snapshot
    Ready(&'a Snapshot),
}

impl<'a> CacheRead<'a> {
    /// The cached snapshot, if any.
    pub fn ready(&self) -> Option<&'a Snapshot> {
        match self {
            CacheRead::Empty => None,
            CacheRead::Ready(s) => Some(s),
        }
    }
}

/// Single-slot store for the last successfully applied snapshot.
///
/// The slot is overwritten whole; readers on the single-threaded render
/// pipeline never observe a partial snapshot.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    slot: Option<Snapshot>,
}

impl SnapshotCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cached snapshot.
    pub fn set(&mut self, snapshot: Snapshot) {
        self.slot = Some(snapshot);
    }

    /// Reads the cache slot.
    pub fn get(&self) -> CacheRead<'_> {
        match &self.slot {
            Some(s) => CacheRead::Ready(s),
            None => CacheRead::Empty,
        }
    }

    /// True before the first successful `set`.
    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}
