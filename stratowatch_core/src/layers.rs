//! Pluggable secondary-layer interface.
//!
//! The air-quality, weather and aircraft layers share one processing shape:
//! turn the layer's records into overlay specs, and fold them into summary
//! fields. Each layer implements `SecondaryLayer` and the refresh pipeline
//! iterates a configured registry, instead of duplicating three
//! near-identical snapshot-processing paths.

use crate::classify::{aqi_bucket, separation_band};
use crate::overlay::{OverlayKind, OverlaySpec};
use crate::snapshot::{Balloon, RiskEncounter, Snapshot};
use crate::summary::{
    summarize_air_quality, summarize_weather, AirQualitySummary, MissingPollutantPolicy,
    WeatherSummary,
};
use serde::{Deserialize, Serialize};

/// Assumed altitude of a sounding balloon when the feed does not report one.
pub const DEFAULT_BALLOON_ALTITUDE_M: f64 = 20_000.0;

// ============================================================================
// LAYER CONTRACT
// ============================================================================

/// Summary fields produced by one secondary layer. `None` inner values are
/// the explicit "no data" state for an empty layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LayerSummary {
    AirQuality(Option<AirQualitySummary>),
    Weather(Option<WeatherSummary>),
    AirTraffic(Option<AirTrafficSummary>),
}

/// One optional data layer drawn on top of the balloon constellation.
pub trait SecondaryLayer: Send + Sync {
    /// Stable key, doubling as the feed query flag name.
    fn key(&self) -> &'static str;

    /// Overlay specs for this layer's records in the given snapshot.
    fn load_markers(&self, snapshot: &Snapshot) -> Vec<OverlaySpec>;

    /// Summary fields for this layer's records in the given snapshot.
    fn summarize(&self, snapshot: &Snapshot) -> LayerSummary;
}

fn balloon_by_id(snapshot: &Snapshot, id: u32) -> Option<&Balloon> {
    snapshot.balloons.iter().find(|b| b.id == id)
}

// ============================================================================
// AIR QUALITY LAYER
// ============================================================================

/// Air-quality badges at balloon positions, colored by AQI band.
pub struct AirQualityLayer {
    pub policy: MissingPollutantPolicy,
}

impl Default for AirQualityLayer {
    fn default() -> Self {
        Self {
            policy: MissingPollutantPolicy::ZeroFill,
        }
    }
}

impl SecondaryLayer for AirQualityLayer {
    fn key(&self) -> &'static str {
        "air_quality"
    }

    fn load_markers(&self, snapshot: &Snapshot) -> Vec<OverlaySpec> {
        let mut specs = Vec::new();
        for (&balloon_id, reading) in &snapshot.air_quality {
            let Some(balloon) = balloon_by_id(snapshot, balloon_id) else { continue };
            let Some(pos) = balloon.current_position() else { continue };

            let band = aqi_bucket(reading.aqi);
            let pollutants = reading
                .pollutants
                .iter()
                .map(|(name, p)| format!("{}: {} {}", name.to_uppercase(), p.value, p.unit))
                .collect::<Vec<_>>()
                .join("\n");
            specs.push(OverlaySpec {
                id: format!("air-quality-{balloon_id}"),
                kind: OverlayKind::AirQualityMarker {
                    lat: pos[0],
                    lon: pos[1],
                    aqi: reading.aqi,
                    band,
                },
                label: format!(
                    "Air Quality at Balloon {balloon_id}\nAQI: {} ({})\nLocation: {}\nMeasurements: {}\n{pollutants}",
                    reading.aqi,
                    band.label(),
                    reading.location,
                    reading.measurement_count,
                ),
            });
        }
        specs
    }

    fn summarize(&self, snapshot: &Snapshot) -> LayerSummary {
        LayerSummary::AirQuality(summarize_air_quality(&snapshot.air_quality, self.policy))
    }
}

// ============================================================================
// WEATHER LAYER
// ============================================================================

/// Weather badges at balloon positions.
#[derive(Default)]
pub struct WeatherLayer;

impl SecondaryLayer for WeatherLayer {
    fn key(&self) -> &'static str {
        "weather"
    }

    fn load_markers(&self, snapshot: &Snapshot) -> Vec<OverlaySpec> {
        let mut specs = Vec::new();
        for (&balloon_id, reading) in &snapshot.weather {
            let Some(balloon) = balloon_by_id(snapshot, balloon_id) else { continue };
            let Some(pos) = balloon.current_position() else { continue };

            specs.push(OverlaySpec {
                id: format!("weather-{balloon_id}"),
                kind: OverlayKind::WeatherMarker {
                    lat: pos[0],
                    lon: pos[1],
                    temperature: reading.temperature,
                    wind_speed: reading.wind_speed,
                },
                label: format!(
                    "Weather at Balloon {balloon_id}\n{}\nTemperature: {:.1} °C\nWind: {:.1} km/h @ {:.0}°\nPressure: {:.1} hPa\nHumidity: {:.0}%",
                    reading.weather_description,
                    reading.temperature,
                    reading.wind_speed,
                    reading.wind_direction,
                    reading.pressure,
                    reading.humidity,
                ),
            });
        }
        specs
    }

    fn summarize(&self, snapshot: &Snapshot) -> LayerSummary {
        LayerSummary::Weather(summarize_weather(&snapshot.weather))
    }
}

// ============================================================================
// AIR TRAFFIC LAYER
// ============================================================================

/// Per-tier encounter counts plus separation-band counts over all listed
/// encounters. The risk tier comes from the feed's safety analysis and is
/// never re-derived here; only the display banding is local.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AirTrafficSummary {
    pub total_aircraft: usize,
    pub near_misses: usize,
    pub high_risk: usize,
    pub medium_risk: usize,
    pub low_risk: usize,
    /// Counts per separation band: [critical, warning, good]
    pub separation_bands: [u32; 3],
}

/// Aircraft markers plus encounter badges from the consumed safety analysis.
pub struct AirTrafficLayer {
    /// Balloon altitude assumed when banding an encounter whose record
    /// reports none (sounding balloons cruise near 20 km).
    pub assumed_balloon_altitude_m: f64,
}

impl Default for AirTrafficLayer {
    fn default() -> Self {
        Self {
            assumed_balloon_altitude_m: DEFAULT_BALLOON_ALTITUDE_M,
        }
    }
}

impl AirTrafficLayer {
    fn encounter_specs(
        &self,
        snapshot: &Snapshot,
        tier: &str,
        encounters: &[RiskEncounter],
        specs: &mut Vec<OverlaySpec>,
    ) {
        for (idx, encounter) in encounters.iter().enumerate() {
            let Some(balloon) = balloon_by_id(snapshot, encounter.balloon_id) else { continue };
            let Some(pos) = balloon.current_position() else { continue };

            let band = separation_band(
                self.band_altitude(encounter),
                encounter.aircraft_altitude,
            );
            specs.push(OverlaySpec {
                id: format!("encounter-{tier}-{}-{idx}", encounter.balloon_id),
                kind: OverlayKind::EncounterMarker {
                    lat: pos[0],
                    lon: pos[1],
                    aircraft_callsign: encounter.aircraft_callsign.clone(),
                    band,
                },
                label: format!(
                    "{tier} encounter: Balloon {} / {}\nHorizontal: {:.0} m\nVertical: {:.0} m",
                    encounter.balloon_id,
                    encounter.aircraft_callsign.trim(),
                    encounter.horizontal_distance,
                    encounter.vertical_distance,
                ),
            });
        }
    }

    fn band_altitude(&self, encounter: &RiskEncounter) -> f64 {
        if encounter.balloon_altitude > 0.0 {
            encounter.balloon_altitude
        } else {
            self.assumed_balloon_altitude_m
        }
    }

    fn count_bands(&self, encounters: &[&RiskEncounter]) -> [u32; 3] {
        let mut bands = [0u32; 3];
        for encounter in encounters {
            let idx = match separation_band(
                self.band_altitude(encounter),
                encounter.aircraft_altitude,
            ) {
                crate::classify::SeparationBand::Critical => 0,
                crate::classify::SeparationBand::Warning => 1,
                crate::classify::SeparationBand::Good => 2,
            };
            bands[idx] += 1;
        }
        bands
    }
}

impl SecondaryLayer for AirTrafficLayer {
    fn key(&self) -> &'static str {
        "air_traffic"
    }

    fn load_markers(&self, snapshot: &Snapshot) -> Vec<OverlaySpec> {
        let mut specs = Vec::new();
        for aircraft in &snapshot.aircraft {
            let Some((lat, lon)) = aircraft.position() else { continue };
            if aircraft.on_ground {
                continue;
            }
            let altitude_m = aircraft.best_altitude();
            let altitude_text = altitude_m
                .map(|a| format!("{a:.0} m"))
                .unwrap_or_else(|| "unknown".to_string());
            specs.push(OverlaySpec {
                id: format!("aircraft-{}", aircraft.icao24),
                kind: OverlayKind::AircraftMarker {
                    lat,
                    lon,
                    callsign: aircraft.callsign.trim().to_string(),
                    altitude_m,
                },
                label: format!(
                    "Aircraft {}\nCallsign: {}\nAltitude: {altitude_text}",
                    aircraft.icao24,
                    aircraft.callsign.trim(),
                ),
            });
        }

        if let Some(safety) = &snapshot.safety_analysis {
            self.encounter_specs(snapshot, "near-miss", &safety.near_misses, &mut specs);
            self.encounter_specs(snapshot, "high", &safety.high_risk_encounters, &mut specs);
            self.encounter_specs(snapshot, "medium", &safety.medium_risk_encounters, &mut specs);
        }
        specs
    }

    fn summarize(&self, snapshot: &Snapshot) -> LayerSummary {
        if snapshot.aircraft.is_empty() && snapshot.safety_analysis.is_none() {
            return LayerSummary::AirTraffic(None);
        }
        let mut summary = AirTrafficSummary {
            total_aircraft: snapshot.aircraft.len(),
            ..Default::default()
        };
        if let Some(safety) = &snapshot.safety_analysis {
            summary.near_misses = safety.near_misses.len();
            summary.high_risk = safety.high_risk_encounters.len();
            summary.medium_risk = safety.medium_risk_encounters.len();
            summary.low_risk = safety.low_risk_encounters.len();

            let all: Vec<&RiskEncounter> = safety
                .near_misses
                .iter()
                .chain(&safety.high_risk_encounters)
                .chain(&safety.medium_risk_encounters)
                .chain(&safety.low_risk_encounters)
                .collect();
            summary.separation_bands = self.count_bands(&all);
        }
        LayerSummary::AirTraffic(Some(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::AqiBucket;
    use crate::snapshot::{AirQualityReading, Aircraft, SafetyAnalysis};
    use serde_json::json;

    fn snapshot_with_layers() -> Snapshot {
        Snapshot::from_value(json!({
            "last_updated": "2025-06-01T12:00:00",
            "balloons": [
                { "id": 0, "path": [[10.0, 20.0]], "velocities": [[40.0, 90.0]] },
                { "id": 1, "path": [], "velocities": [] }
            ],
            "air_quality": {
                "0": { "aqi": 120.0, "location": "Springfield", "measurement_count": 4 },
                "1": { "aqi": 30.0 }
            },
            "weather": {
                "0": { "temperature": 15.0, "wind_speed": 12.0, "pressure": 1013.0, "humidity": 60.0 }
            },
            "aircraft": [
                { "icao24": "abc123", "callsign": "UAL42  ", "latitude": 10.1, "longitude": 20.1,
                  "altitude": 11000.0 },
                { "icao24": "ground1", "callsign": "TAXI", "latitude": 10.0, "longitude": 20.0,
                  "altitude": 0.0, "on_ground": true },
                { "icao24": "nofix", "callsign": "LOST" }
            ],
            "safety_analysis": {
                "total_aircraft": 3,
                "high_risk_encounters": [
                    { "balloon_id": 0, "aircraft_callsign": "UAL42", "horizontal_distance": 1800.0,
                      "vertical_distance": 9000.0, "aircraft_altitude": 11000.0, "balloon_altitude": 20000.0 }
                ]
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_air_quality_markers_skip_fixless_balloons() {
        let snapshot = snapshot_with_layers();
        let layer = AirQualityLayer::default();
        let specs = layer.load_markers(&snapshot);

        // Balloon 1 has a reading but no fix
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].id, "air-quality-0");
        match &specs[0].kind {
            OverlayKind::AirQualityMarker { band, aqi, .. } => {
                assert_eq!(*band, AqiBucket::UnhealthySensitive);
                assert_eq!(*aqi, 120.0);
            }
            other => panic!("unexpected overlay kind: {other:?}"),
        }
    }

    #[test]
    fn test_weather_layer_summary_and_markers() {
        let snapshot = snapshot_with_layers();
        let layer = WeatherLayer;
        assert_eq!(layer.load_markers(&snapshot).len(), 1);

        let LayerSummary::Weather(Some(summary)) = layer.summarize(&snapshot) else {
            panic!("expected weather summary");
        };
        assert_eq!(summary.station_count, 1);
        assert_eq!(summary.avg_temperature, 15.0);
    }

    #[test]
    fn test_air_traffic_markers_guard_position_and_ground() {
        let snapshot = snapshot_with_layers();
        let layer = AirTrafficLayer::default();
        let specs = layer.load_markers(&snapshot);

        // One airborne aircraft with a fix, plus one high-risk encounter badge
        let aircraft: Vec<_> = specs.iter().filter(|s| s.id.starts_with("aircraft-")).collect();
        let encounters: Vec<_> =
            specs.iter().filter(|s| s.id.starts_with("encounter-")).collect();
        assert_eq!(aircraft.len(), 1);
        assert_eq!(aircraft[0].id, "aircraft-abc123");
        assert_eq!(encounters.len(), 1);
        match &encounters[0].kind {
            OverlayKind::EncounterMarker { band, .. } => {
                // |20000 - 11000| = 9000 -> warning
                assert_eq!(*band, crate::classify::SeparationBand::Warning);
            }
            other => panic!("unexpected overlay kind: {other:?}"),
        }
    }

    #[test]
    fn test_air_traffic_summary_counts() {
        let snapshot = snapshot_with_layers();
        let layer = AirTrafficLayer::default();
        let LayerSummary::AirTraffic(Some(summary)) = layer.summarize(&snapshot) else {
            panic!("expected air traffic summary");
        };
        assert_eq!(summary.total_aircraft, 3);
        assert_eq!(summary.high_risk, 1);
        assert_eq!(summary.separation_bands, [0, 1, 0]);
    }

    #[test]
    fn test_empty_air_traffic_is_no_data() {
        let snapshot = Snapshot {
            last_updated: "t".to_string(),
            balloons: vec![],
            constellation: None,
            air_quality: Default::default(),
            weather: Default::default(),
            aircraft: vec![],
            safety_analysis: None,
            insights: None,
        };
        let layer = AirTrafficLayer::default();
        assert_eq!(layer.summarize(&snapshot), LayerSummary::AirTraffic(None));
        assert!(layer.load_markers(&snapshot).is_empty());
    }

    #[test]
    fn test_assumed_balloon_altitude_applies_when_unreported() {
        let layer = AirTrafficLayer::default();
        let encounter = RiskEncounter {
            aircraft_altitude: 16_000.0,
            balloon_altitude: 0.0,
            ..Default::default()
        };
        // Assumed 20 km balloon altitude: |20000 - 16000| = 4000 -> critical
        assert_eq!(layer.count_bands(&[&encounter]), [1, 0, 0]);
    }

    #[test]
    fn test_unused_aircraft_field_is_ignored() {
        // Extra feed fields must not break parsing
        let aircraft: Aircraft = serde_json::from_value(json!({
            "icao24": "x", "callsign": "Y", "squawk": "7000", "spi": false
        }))
        .unwrap();
        assert_eq!(aircraft.icao24, "x");
    }

    #[test]
    fn test_safety_analysis_defaults() {
        let safety: SafetyAnalysis = serde_json::from_value(json!({})).unwrap();
        assert!(safety.near_misses.is_empty());
        assert_eq!(safety.safety_zones_violated, 0);
    }

    #[test]
    fn test_air_quality_reading_defaults() {
        let reading: AirQualityReading = serde_json::from_value(json!({ "aqi": 10.0 })).unwrap();
        assert_eq!(reading.measurement_count, 0);
        assert!(reading.pollutants.is_empty());
    }
}
