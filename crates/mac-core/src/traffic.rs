//! Validated trajectory storage with a spatial index, plus the 1 Hz
//! resampling used to prepare raw tracks for it.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::models::TrajectorySample;
use crate::spatial::CellPolygon;

/// Side length of one index bucket in degrees (~1.1 km of latitude).
const GRID_CELL_SIZE_DEG: f64 = 0.01;

/// Largest raw gap to interpolate across when resampling, in seconds.
/// Anything longer is treated as two separate flights.
pub const DEFAULT_RESAMPLE_MAX_GAP_S: i64 = 600;

/// Ceiling for the prepared dataset in meters; GA samples above it
/// cannot contribute to low-altitude exposure.
pub const ALTITUDE_CEILING_M: f64 = 3_000.0;

#[derive(Debug, Error, PartialEq)]
pub enum TrafficError {
    #[error("trajectory dataset is empty")]
    Empty,
    #[error("sample {index} ({icao24}) has a non-finite field")]
    NonFiniteSample { index: usize, icao24: String },
    #[error("{icao24} has a sub-second timestamp at {timestamp}; the dataset must be resampled to 1 Hz")]
    SubSecondTimestamp {
        icao24: String,
        timestamp: DateTime<Utc>,
    },
    #[error("{icao24} has duplicate samples at {timestamp}")]
    DuplicateTimestamp {
        icao24: String,
        timestamp: DateTime<Utc>,
    },
}

/// Read-only, time-ordered GA trajectory samples with a uniform lon/lat
/// bucket index for polygon queries.
///
/// Construction enforces the 1 Hz cadence the exposure computation relies
/// on: per aircraft, timestamps must be whole seconds and distinct. Gaps
/// are allowed; unobserved seconds simply count as time outside every
/// cell.
#[derive(Debug)]
pub struct TrajectoryCollection {
    samples: Vec<TrajectorySample>,
    index: HashMap<(i64, i64), Vec<u32>>,
}

impl TrajectoryCollection {
    pub fn new(mut samples: Vec<TrajectorySample>) -> Result<Self, TrafficError> {
        if samples.is_empty() {
            return Err(TrafficError::Empty);
        }
        for (index, sample) in samples.iter().enumerate() {
            let finite = sample.lat.is_finite()
                && sample.lon.is_finite()
                && sample.altitude_m.is_finite()
                && sample.groundspeed_kt.is_finite();
            if !finite {
                return Err(TrafficError::NonFiniteSample {
                    index,
                    icao24: sample.icao24.clone(),
                });
            }
            if sample.timestamp.timestamp_subsec_nanos() != 0 {
                return Err(TrafficError::SubSecondTimestamp {
                    icao24: sample.icao24.clone(),
                    timestamp: sample.timestamp,
                });
            }
        }

        samples.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.icao24.cmp(&b.icao24))
        });
        for pair in samples.windows(2) {
            if pair[0].timestamp == pair[1].timestamp && pair[0].icao24 == pair[1].icao24 {
                return Err(TrafficError::DuplicateTimestamp {
                    icao24: pair[1].icao24.clone(),
                    timestamp: pair[1].timestamp,
                });
            }
        }

        let mut index: HashMap<(i64, i64), Vec<u32>> = HashMap::new();
        for (i, sample) in samples.iter().enumerate() {
            index
                .entry(bucket_of(sample.lon, sample.lat))
                .or_default()
                .push(i as u32);
        }

        Ok(Self { samples, index })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples whose position lies inside the polygon, in the collection's
    /// time order. Only index buckets overlapping the polygon's bounding
    /// box are visited.
    pub fn samples_inside(&self, cell: &CellPolygon) -> Vec<&TrajectorySample> {
        let bbox = cell.bounding_box();
        let (min_bx, min_by) = bucket_of(bbox.min_lon, bbox.min_lat);
        let (max_bx, max_by) = bucket_of(bbox.max_lon, bbox.max_lat);

        let mut hits: Vec<u32> = Vec::new();
        for bx in min_bx..=max_bx {
            for by in min_by..=max_by {
                let Some(indices) = self.index.get(&(bx, by)) else {
                    continue;
                };
                for &i in indices {
                    let sample = &self.samples[i as usize];
                    if cell.contains(sample.lon, sample.lat) {
                        hits.push(i);
                    }
                }
            }
        }
        hits.sort_unstable();
        hits.iter().map(|&i| &self.samples[i as usize]).collect()
    }
}

fn bucket_of(lon: f64, lat: f64) -> (i64, i64) {
    (
        (lon / GRID_CELL_SIZE_DEG).floor() as i64,
        (lat / GRID_CELL_SIZE_DEG).floor() as i64,
    )
}

/// Resample raw tracks onto the whole-second grid, one sample per second.
///
/// Samples are grouped per aircraft and sorted by time; a raw gap longer
/// than `max_gap_s` splits the track into separate segments so different
/// flights are never interpolated across. Within a segment, position,
/// altitude and ground speed are interpolated linearly onto every whole
/// second the segment covers.
pub fn resample_1hz(samples: &[TrajectorySample], max_gap_s: i64) -> Vec<TrajectorySample> {
    let mut by_aircraft: BTreeMap<&str, Vec<&TrajectorySample>> = BTreeMap::new();
    for sample in samples {
        by_aircraft
            .entry(sample.icao24.as_str())
            .or_default()
            .push(sample);
    }

    let max_gap = Duration::seconds(max_gap_s);
    let mut out = Vec::new();
    for (_, mut track) in by_aircraft {
        track.sort_by_key(|sample| sample.timestamp);
        let mut start = 0;
        for i in 1..=track.len() {
            let split =
                i == track.len() || track[i].timestamp - track[i - 1].timestamp > max_gap;
            if split {
                resample_segment(&track[start..i], &mut out);
                start = i;
            }
        }
    }
    out
}

fn resample_segment(segment: &[&TrajectorySample], out: &mut Vec<TrajectorySample>) {
    let (Some(first), Some(last)) = (segment.first(), segment.last()) else {
        return;
    };
    // Whole seconds covered by the segment; fractional endpoints snap
    // inward so nothing is extrapolated.
    let start_s = ceil_to_second(first.timestamp);
    let end_s = last.timestamp.timestamp();

    let mut cursor = 0usize;
    for second in start_s..=end_s {
        let Some(timestamp) = DateTime::from_timestamp(second, 0) else {
            continue;
        };
        while cursor + 1 < segment.len() && segment[cursor + 1].timestamp <= timestamp {
            cursor += 1;
        }
        let current = segment[cursor];
        let resampled = match segment.get(cursor + 1) {
            Some(next) => {
                let span_ms = (next.timestamp - current.timestamp).num_milliseconds() as f64;
                if span_ms <= 0.0 {
                    carry(timestamp, current)
                } else {
                    let offset_ms = (timestamp - current.timestamp).num_milliseconds() as f64;
                    let ratio = (offset_ms / span_ms).clamp(0.0, 1.0);
                    TrajectorySample {
                        timestamp,
                        icao24: current.icao24.clone(),
                        lat: current.lat + (next.lat - current.lat) * ratio,
                        lon: current.lon + (next.lon - current.lon) * ratio,
                        altitude_m: current.altitude_m
                            + (next.altitude_m - current.altitude_m) * ratio,
                        groundspeed_kt: current.groundspeed_kt
                            + (next.groundspeed_kt - current.groundspeed_kt) * ratio,
                    }
                }
            }
            None => carry(timestamp, current),
        };
        out.push(resampled);
    }
}

fn carry(timestamp: DateTime<Utc>, sample: &TrajectorySample) -> TrajectorySample {
    TrajectorySample {
        timestamp,
        icao24: sample.icao24.clone(),
        lat: sample.lat,
        lon: sample.lon,
        altitude_m: sample.altitude_m,
        groundspeed_kt: sample.groundspeed_kt,
    }
}

fn ceil_to_second(timestamp: DateTime<Utc>) -> i64 {
    let second = timestamp.timestamp();
    if timestamp.timestamp_subsec_nanos() == 0 {
        second
    } else {
        second + 1
    }
}

/// Keep only samples strictly below the altitude ceiling.
pub fn filter_below_ceiling(
    samples: Vec<TrajectorySample>,
    ceiling_m: f64,
) -> Vec<TrajectorySample> {
    samples
        .into_iter()
        .filter(|sample| sample.altitude_m < ceiling_m)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::CellPolygon;

    const BASE_S: i64 = 1_683_000_000;

    fn sample(second: i64, icao24: &str, lat: f64, lon: f64) -> TrajectorySample {
        TrajectorySample {
            timestamp: DateTime::from_timestamp(second, 0).unwrap(),
            icao24: icao24.to_string(),
            lat,
            lon,
            altitude_m: 120.0,
            groundspeed_kt: 90.0,
        }
    }

    #[test]
    fn rejects_empty_dataset() {
        assert_eq!(
            TrajectoryCollection::new(Vec::new()).unwrap_err(),
            TrafficError::Empty
        );
    }

    #[test]
    fn rejects_sub_second_timestamp() {
        let mut bad = sample(BASE_S, "abc123", 59.0, 17.0);
        bad.timestamp = DateTime::from_timestamp(BASE_S, 500_000_000).unwrap();
        assert!(matches!(
            TrajectoryCollection::new(vec![bad]),
            Err(TrafficError::SubSecondTimestamp { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_timestamp_per_aircraft() {
        let samples = vec![
            sample(BASE_S, "abc123", 59.0, 17.0),
            sample(BASE_S, "abc123", 59.1, 17.1),
        ];
        assert!(matches!(
            TrajectoryCollection::new(samples),
            Err(TrafficError::DuplicateTimestamp { .. })
        ));
    }

    #[test]
    fn same_second_across_aircraft_is_fine() {
        let samples = vec![
            sample(BASE_S, "abc123", 59.0, 17.0),
            sample(BASE_S, "def456", 59.1, 17.1),
        ];
        assert_eq!(TrajectoryCollection::new(samples).unwrap().len(), 2);
    }

    #[test]
    fn rejects_non_finite_sample() {
        let mut bad = sample(BASE_S, "abc123", 59.0, 17.0);
        bad.groundspeed_kt = f64::NAN;
        assert!(matches!(
            TrajectoryCollection::new(vec![bad]),
            Err(TrafficError::NonFiniteSample { .. })
        ));
    }

    #[test]
    fn samples_inside_uses_only_matching_positions() {
        let cell = CellPolygon::from_ring(&[
            [17.0, 59.0],
            [17.01, 59.0],
            [17.01, 59.01],
            [17.0, 59.01],
        ])
        .unwrap();

        let samples = vec![
            sample(BASE_S, "inside1", 59.005, 17.005),
            sample(BASE_S + 1, "inside1", 59.006, 17.004),
            sample(BASE_S, "faraway", 60.5, 18.5),
            // Lands in a visited index bucket but outside the cell.
            sample(BASE_S + 2, "nearby0", 59.005, 17.015),
        ];
        let collection = TrajectoryCollection::new(samples).unwrap();

        let inside = collection.samples_inside(&cell);
        assert_eq!(inside.len(), 2);
        assert!(inside.iter().all(|s| s.icao24 == "inside1"));

        // Two queries over the same data agree exactly.
        let again = collection.samples_inside(&cell);
        let first: Vec<_> = inside.iter().map(|s| (s.timestamp, &s.icao24)).collect();
        let second: Vec<_> = again.iter().map(|s| (s.timestamp, &s.icao24)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn resample_fills_whole_seconds() {
        let mut a = sample(BASE_S, "abc123", 59.0, 17.0);
        a.altitude_m = 100.0;
        let mut b = sample(BASE_S + 10, "abc123", 59.1, 17.0);
        b.altitude_m = 200.0;

        let resampled = resample_1hz(&[a, b], DEFAULT_RESAMPLE_MAX_GAP_S);
        assert_eq!(resampled.len(), 11);
        assert_eq!(resampled[0].timestamp.timestamp(), BASE_S);
        assert_eq!(resampled[10].timestamp.timestamp(), BASE_S + 10);

        let mid = &resampled[5];
        assert!((mid.lat - 59.05).abs() < 1e-9);
        assert!((mid.altitude_m - 150.0).abs() < 1e-9);
        assert_eq!(mid.timestamp.timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn resample_does_not_bridge_long_gaps() {
        let a = sample(BASE_S, "abc123", 59.0, 17.0);
        let b = sample(BASE_S + 700, "abc123", 59.1, 17.0);

        let resampled = resample_1hz(&[a, b], DEFAULT_RESAMPLE_MAX_GAP_S);
        // Each point stands alone as its own one-sample segment.
        assert_eq!(resampled.len(), 2);
        assert_eq!(resampled[0].timestamp.timestamp(), BASE_S);
        assert_eq!(resampled[1].timestamp.timestamp(), BASE_S + 700);
    }

    #[test]
    fn resample_snaps_fractional_endpoints_inward() {
        let mut a = sample(BASE_S, "abc123", 59.0, 17.0);
        a.timestamp = DateTime::from_timestamp(BASE_S, 500_000_000).unwrap();
        let mut b = sample(BASE_S + 3, "abc123", 59.3, 17.0);
        b.timestamp = DateTime::from_timestamp(BASE_S + 3, 500_000_000).unwrap();

        let resampled = resample_1hz(&[a, b], DEFAULT_RESAMPLE_MAX_GAP_S);
        let seconds: Vec<i64> = resampled.iter().map(|s| s.timestamp.timestamp()).collect();
        assert_eq!(seconds, vec![BASE_S + 1, BASE_S + 2, BASE_S + 3]);
        assert!(resampled
            .iter()
            .all(|s| s.timestamp.timestamp_subsec_nanos() == 0));
    }

    #[test]
    fn resample_keeps_aircraft_apart() {
        let samples = vec![
            sample(BASE_S, "abc123", 59.0, 17.0),
            sample(BASE_S + 2, "abc123", 59.2, 17.0),
            sample(BASE_S, "def456", 10.0, -60.0),
            sample(BASE_S + 2, "def456", 10.2, -60.0),
        ];
        let resampled = resample_1hz(&samples, DEFAULT_RESAMPLE_MAX_GAP_S);
        assert_eq!(resampled.len(), 6);

        let abc_mid = resampled
            .iter()
            .find(|s| s.icao24 == "abc123" && s.timestamp.timestamp() == BASE_S + 1)
            .unwrap();
        assert!((abc_mid.lat - 59.1).abs() < 1e-9);
    }

    #[test]
    fn ceiling_filter_is_strict() {
        let mut low = sample(BASE_S, "abc123", 59.0, 17.0);
        low.altitude_m = 2_999.0;
        let mut at = sample(BASE_S + 1, "abc123", 59.0, 17.0);
        at.altitude_m = ALTITUDE_CEILING_M;
        let mut above = sample(BASE_S + 2, "abc123", 59.0, 17.0);
        above.altitude_m = 3_500.0;

        let kept = filter_below_ceiling(vec![low, at, above], ALTITUDE_CEILING_M);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].altitude_m, 2_999.0);
    }
}
