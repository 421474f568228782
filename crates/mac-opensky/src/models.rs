//! Wire types for the OpenSky Network REST API.

use serde::Deserialize;

/// One flight as listed by `/flights/departure` or `/flights/arrival`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSummary {
    pub icao24: String,
    /// First seen in the window, unix seconds. Together with `icao24`
    /// this identifies the flight for the track lookup.
    pub first_seen: i64,
    pub last_seen: i64,
    #[serde(default)]
    pub est_departure_airport: Option<String>,
    #[serde(default)]
    pub est_arrival_airport: Option<String>,
    #[serde(default)]
    pub callsign: Option<String>,
}

/// Waypoint track of one flight, from `/tracks/all`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightTrack {
    pub icao24: String,
    pub start_time: f64,
    pub end_time: f64,
    #[serde(default)]
    pub callsign: Option<String>,
    pub path: Vec<TrackPoint>,
}

/// One waypoint, serialized by OpenSky as the array
/// `[time, latitude, longitude, baro_altitude, true_track, on_ground]`
/// with nulls for fields the receiver never saw.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TrackPoint(
    pub i64,
    pub Option<f64>,
    pub Option<f64>,
    pub Option<f64>,
    pub Option<f64>,
    pub bool,
);

impl TrackPoint {
    pub fn time_s(&self) -> i64 {
        self.0
    }

    pub fn lat(&self) -> Option<f64> {
        self.1
    }

    pub fn lon(&self) -> Option<f64> {
        self.2
    }

    pub fn baro_altitude_m(&self) -> Option<f64> {
        self.3
    }

    pub fn on_ground(&self) -> bool {
        self.5
    }
}
