//! Unit tests for sr-core primitives.

#[cfg(test)]
mod ids {
    use crate::{EdgeId, NodeId, RouteId, UserId};

    #[test]
    fn index_roundtrip() {
        let id = NodeId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(NodeId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(NodeId::INVALID.0, u32::MAX);
        assert_eq!(EdgeId::default(), EdgeId::INVALID);
    }

    #[test]
    fn display() {
        assert_eq!(NodeId(7).to_string(), "NodeId(7)");
        assert_eq!(UserId::from("u-1").to_string(), "u-1");
        assert_eq!(RouteId::new("r-9").as_str(), "r-9");
    }
}

#[cfg(test)]
mod geo {
    use crate::geo::{distance_km, eta, DEFAULT_CRUISING_SPEED_KMH};
    use crate::{GeoPoint, NodeKey};

    #[test]
    fn identical_points_are_exactly_zero() {
        let p = GeoPoint::new(22.3039, 70.8022);
        assert_eq!(p.distance_m(p), 0.0);
    }

    #[test]
    fn one_degree_of_latitude() {
        let a = GeoPoint::new(30.0, -88.0);
        let b = GeoPoint::new(31.0, -88.0);
        let d = a.distance_m(b);
        assert!((d - 111_195.0).abs() < 50.0, "got {d}");
        assert!((distance_km(a, b) - 111.195).abs() < 0.05);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = GeoPoint::new(22.30, 70.80);
        let b = GeoPoint::new(22.31, 70.82);
        assert!((a.distance_m(b) - b.distance_m(a)).abs() < 1e-9);
    }

    #[test]
    fn lerp_endpoints() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(1.0, 2.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), GeoPoint::new(0.5, 1.0));
    }

    #[test]
    fn validity() {
        assert!(GeoPoint::new(22.3, 70.8).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 70.8).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(GeoPoint::checked(0.0, 181.0).is_err());
    }

    #[test]
    fn eta_uses_given_speed() {
        // 10 km at 50 km/h = 12 min
        let d = eta(10_000.0, 50.0);
        assert!((d.as_secs_f64() - 720.0).abs() < 1e-6);
    }

    #[test]
    fn eta_falls_back_to_cruising_speed() {
        let expected = eta(5_000.0, DEFAULT_CRUISING_SPEED_KMH);
        assert_eq!(eta(5_000.0, 0.0), expected);
        assert_eq!(eta(5_000.0, -3.0), expected);
        assert_eq!(eta(5_000.0, f64::NAN), expected);
    }

    #[test]
    fn eta_saturates_at_crawling_speed() {
        assert_eq!(eta(20_000_000.0, 1e-15), std::time::Duration::MAX);
    }

    #[test]
    fn eta_negative_distance_is_zero() {
        assert_eq!(eta(-10.0, 40.0).as_secs(), 0);
    }

    #[test]
    fn node_key_collapses_sub_precision_offsets() {
        let a = GeoPoint::new(22.303_900_01, 70.802_200_04);
        let b = GeoPoint::new(22.303_899_98, 70.802_199_97);
        assert_eq!(a.node_key(), b.node_key());
        assert_ne!(a.node_key(), GeoPoint::new(22.303_901, 70.8022).node_key());
    }

    #[test]
    fn node_key_display() {
        let k = GeoPoint::new(22.3039, 70.8022).node_key();
        assert_eq!(k.to_string(), "22.303900,70.802200");
        let neg = NodeKey::from_point(GeoPoint::new(-0.5, -88.000_001));
        assert_eq!(neg.to_string(), "-0.500000,-88.000001");
    }

    #[test]
    fn node_key_has_no_negative_zero() {
        let a = GeoPoint::new(-0.000_000_1, 0.0).node_key();
        let b = GeoPoint::new(0.000_000_1, 0.0).node_key();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "0.000000,0.000000");
    }

    #[test]
    fn unit_vector_chord_orders_like_haversine() {
        let origin = GeoPoint::new(22.30, 70.80);
        let near = GeoPoint::new(22.301, 70.80);
        let far = GeoPoint::new(22.30, 70.81);
        let chord = |a: [f64; 3], b: [f64; 3]| {
            (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)
        };
        let o = origin.to_unit_vector();
        assert!(origin.distance_m(near) < origin.distance_m(far));
        assert!(chord(o, near.to_unit_vector()) < chord(o, far.to_unit_vector()));
    }
}

#[cfg(test)]
mod traffic {
    use crate::{GeoPoint, TrafficLevel, TrafficSample};

    #[test]
    fn multiplier_mapping_is_total() {
        assert_eq!(TrafficLevel::Light.multiplier(), 1.2);
        assert_eq!(TrafficLevel::Moderate.multiplier(), 1.8);
        assert_eq!(TrafficLevel::Heavy.multiplier(), 2.5);
        assert_eq!(TrafficLevel::Blocked.multiplier(), 10.0);
    }

    #[test]
    fn parse_names_and_codes() {
        assert_eq!(TrafficLevel::parse("Heavy"), Some(TrafficLevel::Heavy));
        assert_eq!(TrafficLevel::parse("4"), Some(TrafficLevel::Blocked));
        assert_eq!(TrafficLevel::parse("gridlock"), None);
    }

    #[test]
    fn sample_from_level() {
        let s = TrafficSample::from_level("Kalawad Road", TrafficLevel::Moderate, 100, GeoPoint::default());
        assert_eq!(s.multiplier, 1.8);
        assert_eq!(s.road_name, "Kalawad Road");
    }

    #[test]
    fn trailing_window_is_exclusive() {
        let s = TrafficSample::from_level("r", TrafficLevel::Light, 1_000, GeoPoint::default());
        assert!(s.is_current(1_000 + 1_799, 1_800));
        assert!(!s.is_current(1_000 + 1_800, 1_800));
    }
}

#[cfg(test)]
mod config {
    use crate::PlannerConfig;

    #[test]
    fn defaults_validate() {
        let c = PlannerConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.routing_speed_kmh, 40.0);
        assert_eq!(c.waypoint_radius_m, 50.0);
        assert_eq!(c.traffic_window_secs, 1_800);
    }

    #[test]
    fn rejects_bad_values() {
        let c = PlannerConfig { routing_speed_kmh: 0.0, ..PlannerConfig::default() };
        assert!(c.validate().is_err());
        let c = PlannerConfig { fallback_segments: 0, ..PlannerConfig::default() };
        assert!(c.validate().is_err());
        let c = PlannerConfig { detour_multiplier_threshold: -1.0, ..PlannerConfig::default() };
        assert!(c.validate().is_err());
    }

    #[test]
    fn routing_minutes_at_forty() {
        // 20 km at 40 km/h = 30 min
        assert!((PlannerConfig::default().routing_minutes(20_000.0) - 30.0).abs() < 1e-9);
    }
}
