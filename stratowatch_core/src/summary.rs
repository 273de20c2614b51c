//! Statistical summaries over the current snapshot.
//!
//! Every mean over a secondary-layer collection resolves to a typed
//! "no data" marker (`None`) when the collection is empty; a zero in the
//! output is always a real measured zero, never a masked empty state.

use crate::classify::{speed_bucket, SpeedBucket};
use crate::snapshot::{
    AirQualityReading, Balloon, GeographicSpread, SpeedDistribution, WeatherReading,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::snapshot::BalloonId;

// ============================================================================
// POLICIES
// ============================================================================

/// How a station missing a specific pollutant sub-reading contributes to
/// that pollutant's mean.
///
/// `ZeroFill` reproduces the reference behavior: a missing reading counts
/// as 0 in both numerator and denominator, which biases the mean downward.
/// That quirk is preserved deliberately as the default; `Skip` averages
/// only over stations that report the pollutant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPollutantPolicy {
    #[default]
    ZeroFill,
    Skip,
}

// ============================================================================
// AIR QUALITY
// ============================================================================

/// Unweighted means over the air-quality layer.
///
/// Per-pollutant fields are `None` when no station reports that pollutant
/// under the `Skip` policy; under `ZeroFill` they are always present for a
/// non-empty layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualitySummary {
    pub station_count: usize,
    pub avg_aqi: f64,
    pub avg_pm25: Option<f64>,
    pub avg_pm10: Option<f64>,
    pub avg_o3: Option<f64>,
}

fn pollutant_mean(
    readings: &BTreeMap<BalloonId, AirQualityReading>,
    name: &str,
    policy: MissingPollutantPolicy,
) -> Option<f64> {
    match policy {
        MissingPollutantPolicy::ZeroFill => {
            let sum: f64 = readings
                .values()
                .map(|r| r.pollutant(name).unwrap_or(0.0))
                .sum();
            Some(sum / readings.len() as f64)
        }
        MissingPollutantPolicy::Skip => {
            let present: Vec<f64> =
                readings.values().filter_map(|r| r.pollutant(name)).collect();
            if present.is_empty() {
                None
            } else {
                Some(present.iter().sum::<f64>() / present.len() as f64)
            }
        }
    }
}

/// Summarizes the air-quality layer. `None` when the layer is empty.
pub fn summarize_air_quality(
    readings: &BTreeMap<BalloonId, AirQualityReading>,
    policy: MissingPollutantPolicy,
) -> Option<AirQualitySummary> {
    if readings.is_empty() {
        return None;
    }
    let avg_aqi =
        readings.values().map(|r| r.aqi).sum::<f64>() / readings.len() as f64;
    Some(AirQualitySummary {
        station_count: readings.len(),
        avg_aqi,
        avg_pm25: pollutant_mean(readings, "pm25", policy),
        avg_pm10: pollutant_mean(readings, "pm10", policy),
        avg_o3: pollutant_mean(readings, "o3", policy),
    })
}

/// Counts stations per AQI band, in band order (good → hazardous).
pub fn aqi_distribution(readings: &BTreeMap<BalloonId, AirQualityReading>) -> [u32; 6] {
    let mut counts = [0u32; 6];
    for reading in readings.values() {
        let idx = match crate::classify::aqi_bucket(reading.aqi) {
            crate::classify::AqiBucket::Good => 0,
            crate::classify::AqiBucket::Moderate => 1,
            crate::classify::AqiBucket::UnhealthySensitive => 2,
            crate::classify::AqiBucket::Unhealthy => 3,
            crate::classify::AqiBucket::VeryUnhealthy => 4,
            crate::classify::AqiBucket::Hazardous => 5,
        };
        counts[idx] += 1;
    }
    counts
}

// ============================================================================
// WEATHER
// ============================================================================

/// Unweighted means over the weather layer. `None` when the layer is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSummary {
    pub station_count: usize,
    pub avg_temperature: f64,
    pub avg_wind_speed: f64,
    pub avg_pressure: f64,
    pub avg_humidity: f64,
}

/// Summarizes the weather layer. `None` when the layer is empty.
pub fn summarize_weather(
    readings: &BTreeMap<BalloonId, WeatherReading>,
) -> Option<WeatherSummary> {
    if readings.is_empty() {
        return None;
    }
    let n = readings.len() as f64;
    Some(WeatherSummary {
        station_count: readings.len(),
        avg_temperature: readings.values().map(|w| w.temperature).sum::<f64>() / n,
        avg_wind_speed: readings.values().map(|w| w.wind_speed).sum::<f64>() / n,
        avg_pressure: readings.values().map(|w| w.pressure).sum::<f64>() / n,
        avg_humidity: readings.values().map(|w| w.humidity).sum::<f64>() / n,
    })
}

// ============================================================================
// FLIGHT INSIGHTS (local recomputation for cross-validation)
// ============================================================================

/// Locally recomputed flight statistics, structurally matching the feed's
/// pre-aggregated `insights` so the two can be compared side by side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightInsights {
    pub total_balloons: u32,
    pub active_balloons: u32,
    pub avg_speed: f64,
    pub speed_distribution: SpeedDistribution,
    pub geographic_spread: GeographicSpread,
    pub constellation_links: u32,
}

/// Speed-bucket histogram over balloons with a current velocity sample.
pub fn speed_histogram(balloons: &[Balloon]) -> SpeedDistribution {
    let mut dist = SpeedDistribution::default();
    for balloon in balloons.iter().filter(|b| b.is_active()) {
        if let Some((speed, _)) = balloon.current_velocity() {
            match speed_bucket(speed) {
                SpeedBucket::Low => dist.low += 1,
                SpeedBucket::Medium => dist.medium += 1,
                SpeedBucket::High => dist.high += 1,
            }
        }
    }
    dist
}

/// Recomputes flight insights from the balloon collection.
///
/// `avg_speed` divides by the active-balloon count, matching the feed
/// producer. Hemisphere counts are taken around the constellation centroid.
pub fn compute_insights(balloons: &[Balloon], constellation_links: u32) -> FlightInsights {
    let mut insights = FlightInsights {
        total_balloons: balloons.len() as u32,
        constellation_links,
        ..Default::default()
    };

    let mut total_speed = 0.0;
    let mut latitudes = Vec::new();
    let mut longitudes = Vec::new();

    for balloon in balloons.iter().filter(|b| b.is_active()) {
        insights.active_balloons += 1;
        if let Some((speed, _)) = balloon.current_velocity() {
            total_speed += speed;
        }
        let pos = balloon.current_position().unwrap_or_default();
        latitudes.push(pos[0]);
        longitudes.push(pos[1]);
    }
    insights.speed_distribution = speed_histogram(balloons);

    if insights.active_balloons > 0 {
        insights.avg_speed = total_speed / insights.active_balloons as f64;

        let avg_lat = latitudes.iter().sum::<f64>() / latitudes.len() as f64;
        let avg_lon = longitudes.iter().sum::<f64>() / longitudes.len() as f64;
        for &lat in &latitudes {
            if lat > avg_lat {
                insights.geographic_spread.north += 1;
            } else {
                insights.geographic_spread.south += 1;
            }
        }
        for &lon in &longitudes {
            if lon > avg_lon {
                insights.geographic_spread.east += 1;
            } else {
                insights.geographic_spread.west += 1;
            }
        }
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::PollutantReading;
    use approx::assert_relative_eq;

    fn reading(aqi: f64, pm25: Option<f64>) -> AirQualityReading {
        let mut pollutants = BTreeMap::new();
        if let Some(value) = pm25 {
            pollutants.insert(
                "pm25".to_string(),
                PollutantReading {
                    value,
                    unit: "µg/m³".to_string(),
                },
            );
        }
        AirQualityReading {
            aqi,
            pollutants,
            ..Default::default()
        }
    }

    fn balloon(id: u32, lat: f64, lon: f64, speed: f64) -> Balloon {
        Balloon {
            id,
            path: vec![[lat, lon]],
            velocities: vec![[speed, 0.0]],
        }
    }

    #[test]
    fn test_empty_air_quality_is_no_data_not_zero() {
        let readings = BTreeMap::new();
        assert!(summarize_air_quality(&readings, MissingPollutantPolicy::ZeroFill).is_none());
        assert!(summarize_weather(&BTreeMap::new()).is_none());
    }

    #[test]
    fn test_zero_fill_biases_mean_downward() {
        let mut readings = BTreeMap::new();
        readings.insert(0, reading(40.0, Some(10.0)));
        readings.insert(1, reading(60.0, None));

        let zero_fill =
            summarize_air_quality(&readings, MissingPollutantPolicy::ZeroFill).unwrap();
        let skip = summarize_air_quality(&readings, MissingPollutantPolicy::Skip).unwrap();

        assert_relative_eq!(zero_fill.avg_aqi, 50.0);
        // ZeroFill counts the missing station as 0: (10 + 0) / 2
        assert_relative_eq!(zero_fill.avg_pm25.unwrap(), 5.0);
        // Skip averages only the reporting station
        assert_relative_eq!(skip.avg_pm25.unwrap(), 10.0);
    }

    #[test]
    fn test_skip_policy_yields_none_when_no_station_reports() {
        let mut readings = BTreeMap::new();
        readings.insert(0, reading(40.0, None));

        let summary = summarize_air_quality(&readings, MissingPollutantPolicy::Skip).unwrap();
        assert_eq!(summary.avg_pm25, None);
        assert_eq!(summary.avg_o3, None);
    }

    #[test]
    fn test_aqi_distribution_band_counts() {
        let mut readings = BTreeMap::new();
        readings.insert(0, reading(30.0, None));
        readings.insert(1, reading(50.0, None));
        readings.insert(2, reading(120.0, None));
        readings.insert(3, reading(350.0, None));

        assert_eq!(aqi_distribution(&readings), [2, 0, 1, 0, 0, 1]);
    }

    #[test]
    fn test_speed_histogram_buckets() {
        let balloons = vec![
            balloon(0, 0.0, 0.0, 20.0),
            balloon(1, 0.0, 0.0, 50.0),
            balloon(2, 0.0, 0.0, 150.0),
            balloon(3, 0.0, 0.0, 200.0),
            Balloon {
                id: 4,
                path: vec![],
                velocities: vec![],
            },
        ];
        let dist = speed_histogram(&balloons);
        assert_eq!(
            dist,
            SpeedDistribution {
                low: 1,
                medium: 2,
                high: 1
            }
        );
    }

    #[test]
    fn test_insights_avg_speed_over_active_balloons() {
        let balloons = vec![
            balloon(0, 10.0, 10.0, 30.0),
            balloon(1, -10.0, -10.0, 90.0),
            Balloon {
                id: 2,
                path: vec![],
                velocities: vec![],
            },
        ];
        let insights = compute_insights(&balloons, 1);
        assert_eq!(insights.total_balloons, 3);
        assert_eq!(insights.active_balloons, 2);
        assert_relative_eq!(insights.avg_speed, 60.0);
        assert_eq!(insights.constellation_links, 1);
        assert_eq!(insights.geographic_spread.north, 1);
        assert_eq!(insights.geographic_spread.south, 1);
    }

    #[test]
    fn test_insights_with_no_active_balloons() {
        let balloons = vec![Balloon {
            id: 0,
            path: vec![],
            velocities: vec![],
        }];
        let insights = compute_insights(&balloons, 0);
        assert_eq!(insights.active_balloons, 0);
        assert_eq!(insights.avg_speed, 0.0);
        assert_eq!(insights.geographic_spread, GeographicSpread::default());
    }
}
