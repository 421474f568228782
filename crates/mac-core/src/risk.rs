//! MAC risk model: vertical overlap probability and per-cell aggregation.

use thiserror::Error;

use crate::altitude::{
    ga_altitude_distribution, ua_altitude_distribution, DistributionError, Normal,
    TruncatedNormal,
};
use crate::constants::RiskConstants;
use crate::exposure::{block_data, Exposure};
use crate::quadrature::{integrate, QuadratureError, DEFAULT_TOLERANCE};
use crate::spatial::CellPolygon;
use crate::traffic::TrajectoryCollection;

#[derive(Debug, Error)]
pub enum RiskError {
    #[error(transparent)]
    Distribution(#[from] DistributionError),
    #[error(transparent)]
    Quadrature(#[from] QuadratureError),
}

/// Risk figures attached to one grid cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellRisk {
    /// Exposure fraction `T` over the observation window.
    pub exposure_fraction: f64,
    /// Mean GA ground speed `v` in the cell, meters per second.
    pub mean_groundspeed_mps: f64,
    /// Collision probability `p`, rounded to 3 decimal places.
    pub collision_probability: f64,
}

/// The per-cell MAC risk model over one fixed set of constants.
pub struct RiskModel {
    constants: RiskConstants,
}

impl RiskModel {
    pub fn new(constants: RiskConstants) -> Self {
        Self { constants }
    }

    pub fn constants(&self) -> &RiskConstants {
        &self.constants
    }

    /// Probability of vertical overlap given horizontal proximity.
    ///
    /// Integrates the UA altitude density against the GA probability mass
    /// within the conflict band around each altitude:
    ///
    /// `p_VC = integral over [0, z_max] of f_UA(x) * (F_GA(x + h) - F_GA(x - h)) dx`
    ///
    /// with `h` half the combined UA and GA height. The bracket grows
    /// with `h`, so taller airframe assumptions can only raise the
    /// result.
    pub fn vertical_conflict_probability(
        &self,
        f_ua: &Normal,
        f_ga: &TruncatedNormal,
    ) -> Result<f64, RiskError> {
        let h = self.constants.half_band_m();
        let p_vc = integrate(
            |x| f_ua.pdf(x) * (f_ga.cdf(x + h) - f_ga.cdf(x - h)),
            0.0,
            self.constants.z_max_m,
            DEFAULT_TOLERANCE,
        )?;
        Ok(p_vc)
    }

    /// Unrounded per-cell collision probability at the reference altitude
    /// distributions: `p = p_VC * p_below * lambda_SMT`.
    ///
    /// The horizontal conflict rate is deliberately not a factor here;
    /// see [`RiskModel::horizontal_conflict_rate`].
    pub fn collision_probability(&self) -> Result<f64, RiskError> {
        let f_ua = ua_altitude_distribution();
        let f_ga = ga_altitude_distribution(self.constants.z_max_m)?;
        let p_vc = self.vertical_conflict_probability(&f_ua, &f_ga)?;
        Ok(p_vc * self.constants.p_below * self.constants.lambda_smt)
    }

    /// Horizontal conflict rate over a buffer area:
    ///
    /// `p_HC = 2 * R_MAC^2 * T * sqrt(v_UA^2 + v_GA^2) / (R_MAC * G)`
    ///
    /// Defined as an extension point for a combined figure; the current
    /// aggregate keeps vertical overlap and exposure separate, so this
    /// rate is reported nowhere downstream yet.
    pub fn horizontal_conflict_rate(
        &self,
        r_mac_m: f64,
        exposure_fraction: f64,
        mean_groundspeed_mps: f64,
        buffer_area_m2: f64,
    ) -> f64 {
        let closing_speed_mps =
            (self.constants.v_ua_mps.powi(2) + mean_groundspeed_mps.powi(2)).sqrt();
        (2.0 * r_mac_m.powi(2) * exposure_fraction * closing_speed_mps)
            / (r_mac_m * buffer_area_m2)
    }

    /// Full risk assessment of one cell: exposure statistics plus the
    /// rounded collision probability.
    pub fn assess_cell(
        &self,
        traffic: &TrajectoryCollection,
        cell: &CellPolygon,
    ) -> Result<CellRisk, RiskError> {
        let exposure = self.cell_exposure(traffic, cell);
        let probability = self.collision_probability()?;
        Ok(CellRisk {
            exposure_fraction: exposure.fraction,
            mean_groundspeed_mps: exposure.mean_groundspeed_mps,
            collision_probability: round_probability(probability),
        })
    }

    /// Exposure of one cell over this model's observation window.
    pub fn cell_exposure(&self, traffic: &TrajectoryCollection, cell: &CellPolygon) -> Exposure {
        block_data(traffic, cell, self.constants.t_total_s)
    }
}

/// Round to the 3 decimal places carried in the output properties.
pub fn round_probability(p: f64) -> f64 {
    (p * 1_000.0).round() / 1_000.0
}
