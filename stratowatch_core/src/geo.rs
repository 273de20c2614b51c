//! Geodesic helpers for the proximity and safety layers.

/// Mean Earth radius in meters (IUGG value used by the feed producer).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two WGS84 points via the haversine formula.
///
/// Total over all real inputs; no error conditions. Accuracy is bounded by
/// the spherical-Earth assumption (~0.5%), which is fine for the hundreds-of-
/// kilometers thresholds this engine classifies against.
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_distance_to_self_is_zero() {
        assert_eq!(distance_meters(0.0, 0.0, 0.0, 0.0), 0.0);
        assert_eq!(distance_meters(37.7749, -122.4194, 37.7749, -122.4194), 0.0);
    }

    #[test]
    fn test_antipodal_distance_is_half_circumference() {
        let d = distance_meters(0.0, 0.0, 0.0, 180.0);
        assert_relative_eq!(d, std::f64::consts::PI * EARTH_RADIUS_M, max_relative = 1e-9);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        // One degree of latitude is ~111.2 km on a 6371 km sphere
        let d = distance_meters(0.0, 0.0, 1.0, 0.0);
        assert_relative_eq!(d, 111_194.9, max_relative = 1e-4);
    }

    proptest! {
        #[test]
        fn prop_symmetry(
            lat1 in -90.0f64..90.0, lon1 in -180.0f64..180.0,
            lat2 in -90.0f64..90.0, lon2 in -180.0f64..180.0,
        ) {
            let ab = distance_meters(lat1, lon1, lat2, lon2);
            let ba = distance_meters(lat2, lon2, lat1, lon1);
            prop_assert!((ab - ba).abs() < 1e-6);
        }

        #[test]
        fn prop_identity(lat in -90.0f64..90.0, lon in -180.0f64..180.0) {
            prop_assert!(distance_meters(lat, lon, lat, lon).abs() < 1e-6);
        }

        #[test]
        fn prop_non_negative_and_bounded(
            lat1 in -90.0f64..90.0, lon1 in -180.0f64..180.0,
            lat2 in -90.0f64..90.0, lon2 in -180.0f64..180.0,
        ) {
            let d = distance_meters(lat1, lon1, lat2, lon2);
            prop_assert!(d >= 0.0);
            // Never longer than half the circumference
            prop_assert!(d <= std::f64::consts::PI * EARTH_RADIUS_M + 1e-6);
        }
    }
}
