//! Unit conversions used across the risk pipeline.
//!
//! Recorded datasets carry ground speed in knots while the model works in
//! meters per second. The conversions live here as named functions so a
//! unit mismatch stays visible at the call site.

/// Meters per second in one knot.
pub const KNOTS_TO_MPS: f64 = 0.5144444;

/// Convert a speed in knots to meters per second.
pub fn knots_to_mps(speed_kt: f64) -> f64 {
    speed_kt * KNOTS_TO_MPS
}

/// Convert a speed in meters per second to knots.
pub fn mps_to_knots(speed_mps: f64) -> f64 {
    speed_mps / KNOTS_TO_MPS
}
