//! Conversion of OpenSky waypoint tracks into trajectory samples.
//!
//! OpenSky tracks carry no speed, so ground speed is derived from
//! consecutive waypoints (great-circle distance over the time delta) and
//! reported in knots to match the recorded-dataset convention.

use chrono::{DateTime, Utc};

use mac_core::spatial::haversine_distance;
use mac_core::units::mps_to_knots;
use mac_core::TrajectorySample;

use crate::models::{FlightTrack, TrackPoint};

struct CleanPoint {
    time_s: i64,
    lat: f64,
    lon: f64,
    altitude_m: f64,
}

/// Convert one flight track into trajectory samples.
///
/// Waypoints missing a coordinate or altitude, carrying out-of-range or
/// non-finite values, or not strictly after the previous usable waypoint
/// are dropped. A track with fewer than two usable waypoints yields
/// nothing, since no segment exists to derive a speed from.
pub fn track_to_samples(track: &FlightTrack) -> Vec<TrajectorySample> {
    let mut clean: Vec<CleanPoint> = Vec::with_capacity(track.path.len());
    let mut dropped = 0usize;
    for point in &track.path {
        match clean_point(point, clean.last()) {
            Some(usable) => clean.push(usable),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        tracing::debug!(
            "Dropped {} of {} waypoints from track {}",
            dropped,
            track.path.len(),
            track.icao24
        );
    }
    if clean.len() < 2 {
        return Vec::new();
    }

    let mut samples = Vec::with_capacity(clean.len());
    for (i, point) in clean.iter().enumerate() {
        // The first waypoint inherits the speed of its outgoing segment.
        let (from, to) = if i == 0 {
            (&clean[0], &clean[1])
        } else {
            (&clean[i - 1], &clean[i])
        };
        let dt_s = (to.time_s - from.time_s) as f64;
        let distance_m = haversine_distance(from.lat, from.lon, to.lat, to.lon);
        let groundspeed_kt = mps_to_knots(distance_m / dt_s);

        let Some(timestamp) = DateTime::<Utc>::from_timestamp(point.time_s, 0) else {
            continue;
        };
        samples.push(TrajectorySample {
            timestamp,
            icao24: track.icao24.clone(),
            lat: point.lat,
            lon: point.lon,
            altitude_m: point.altitude_m,
            groundspeed_kt,
        });
    }
    samples
}

fn clean_point(point: &TrackPoint, previous: Option<&CleanPoint>) -> Option<CleanPoint> {
    let lat = point.lat()?;
    let lon = point.lon()?;
    let altitude_m = point.baro_altitude_m()?;
    if !lat.is_finite() || !lon.is_finite() || !altitude_m.is_finite() {
        return None;
    }
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return None;
    }
    if let Some(previous) = previous {
        if point.time_s() <= previous.time_s {
            return None;
        }
    }
    Some(CleanPoint {
        time_s: point.time_s(),
        lat,
        lon,
        altitude_m,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(time_s: i64, lat: f64, lon: f64, altitude_m: f64) -> TrackPoint {
        TrackPoint(time_s, Some(lat), Some(lon), Some(altitude_m), Some(0.0), false)
    }

    fn track(path: Vec<TrackPoint>) -> FlightTrack {
        FlightTrack {
            icao24: "4ac9e5".to_string(),
            start_time: 1_683_000_000.0,
            end_time: 1_683_000_600.0,
            callsign: None,
            path,
        }
    }

    #[test]
    fn derives_speed_from_consecutive_waypoints() {
        // 0.01 degrees of longitude at the equator over 60 seconds.
        let samples = track_to_samples(&track(vec![
            point(1_683_000_000, 0.0, 0.0, 300.0),
            point(1_683_000_060, 0.0, 0.01, 300.0),
        ]));

        assert_eq!(samples.len(), 2);
        assert!((samples[1].groundspeed_kt - 36.024_277_403).abs() < 1e-6);
        // First sample inherits the outgoing segment speed.
        assert_eq!(samples[0].groundspeed_kt, samples[1].groundspeed_kt);
        assert_eq!(samples[0].timestamp.timestamp(), 1_683_000_000);
        assert_eq!(samples[0].icao24, "4ac9e5");
    }

    #[test]
    fn drops_unusable_waypoints() {
        let samples = track_to_samples(&track(vec![
            point(1_683_000_000, 0.0, 0.0, 300.0),
            // Missing latitude.
            TrackPoint(1_683_000_030, None, Some(0.005), Some(300.0), None, false),
            // Out of range.
            point(1_683_000_040, 95.0, 0.006, 300.0),
            // Not after its predecessor.
            point(1_683_000_000, 0.0, 0.007, 300.0),
            point(1_683_000_060, 0.0, 0.01, 300.0),
        ]));

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].timestamp.timestamp(), 1_683_000_060);
    }

    #[test]
    fn too_short_tracks_yield_nothing() {
        assert!(track_to_samples(&track(vec![])).is_empty());
        assert!(track_to_samples(&track(vec![point(1_683_000_000, 0.0, 0.0, 300.0)])).is_empty());

        // Two raw points collapsing to one usable point.
        let samples = track_to_samples(&track(vec![
            point(1_683_000_000, 0.0, 0.0, 300.0),
            TrackPoint(1_683_000_060, Some(0.0), Some(0.01), None, None, false),
        ]));
        assert!(samples.is_empty());
    }
}
