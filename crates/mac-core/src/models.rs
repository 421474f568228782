//! Core data models shared across the risk pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded position report of a GA aircraft.
///
/// Produced by the acquisition stage (or read back from the prepared
/// trajectory dataset) and treated as read-only by the risk model.
/// Field order matches the dataset column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    /// Sample time in UTC. Prepared datasets carry whole seconds only.
    pub timestamp: DateTime<Utc>,
    /// 24-bit ICAO transponder address identifying the airframe.
    pub icao24: String,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Barometric altitude in meters.
    pub altitude_m: f64,
    /// Ground speed in knots, as recorded upstream.
    pub groundspeed_kt: f64,
}
