//! Model constants shared by every per-cell risk computation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A constants override the model cannot run with.
#[derive(Debug, Error, PartialEq)]
pub enum ConstantsError {
    #[error("{field} must be a positive finite number, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must be a non-negative finite number, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must lie in [0, 1], got {value}")]
    OutsideUnitInterval { field: &'static str, value: f64 },
}

/// Fixed parameters of the MAC risk model.
///
/// Loaded once at startup and shared read-only afterwards. `Default`
/// carries the reference values the model was calibrated with, for a
/// one-week observation window. A constants file may override any subset
/// of fields; the rest keep their reference values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConstants {
    /// Upper altitude bound of UA operations in meters
    pub z_max_m: f64,
    /// Probability that a GA aircraft descends into UA airspace at all
    pub p_below: f64,
    /// Strategic and tactical mitigation factor
    pub lambda_smt: f64,
    /// UA body height in meters
    pub h_ua_m: f64,
    /// GA body height in meters
    pub h_ga_m: f64,
    /// UA cruise speed in meters per second
    pub v_ua_mps: f64,
    /// Observation window length in seconds
    pub t_total_s: f64,
}

impl Default for RiskConstants {
    fn default() -> Self {
        Self {
            z_max_m: 100.0,
            p_below: 0.05,
            lambda_smt: 1.0,
            h_ua_m: 31.0,
            h_ga_m: 31.0,
            v_ua_mps: 15.0,
            t_total_s: 604_800.0, // 7 days
        }
    }
}

impl RiskConstants {
    /// Half height of the vertical conflict band, `(h_UA + h_GA) / 2`.
    pub fn half_band_m(&self) -> f64 {
        (self.h_ua_m + self.h_ga_m) / 2.0
    }

    /// Check that overridden values leave the model computable.
    ///
    /// Covers the fields a constants file can reach; the altitude
    /// distribution spreads are validated where those distributions are
    /// constructed.
    pub fn validate(&self) -> Result<(), ConstantsError> {
        for (field, value) in [("z_max_m", self.z_max_m), ("t_total_s", self.t_total_s)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConstantsError::NotPositive { field, value });
            }
        }
        for (field, value) in [
            ("h_ua_m", self.h_ua_m),
            ("h_ga_m", self.h_ga_m),
            ("v_ua_mps", self.v_ua_mps),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConstantsError::Negative { field, value });
            }
        }
        for (field, value) in [("p_below", self.p_below), ("lambda_smt", self.lambda_smt)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConstantsError::OutsideUnitInterval { field, value });
            }
        }
        Ok(())
    }
}
