//! Altitude probability distributions for UA and GA aircraft.
//!
//! The UA holds a tight band around its operating altitude, modeled as an
//! unbounded normal. GA altitude within the integration band is a normal
//! truncated to `[0, z_max]`. Both expose pdf and cdf over all altitudes;
//! outside its support the truncated pdf is zero and the cdf saturates.

use std::f64::consts::{PI, SQRT_2};

use statrs::function::erf::erf;
use thiserror::Error;

/// UA operating altitude, mean and spread in meters.
pub const UA_ALTITUDE_MEAN_M: f64 = 50.0;
pub const UA_ALTITUDE_SD_M: f64 = 5.0;

/// GA low-altitude traffic, mean and spread in meters before truncation.
pub const GA_ALTITUDE_MEAN_M: f64 = 100.0;
pub const GA_ALTITUDE_SD_M: f64 = 50.0;

#[derive(Debug, Error, PartialEq)]
pub enum DistributionError {
    #[error("distribution spread must be positive and finite, got {0}")]
    InvalidSpread(f64),
    #[error("truncating to [{lower_m}, {upper_m}] m leaves no probability mass")]
    EmptyTruncation { lower_m: f64, upper_m: f64 },
}

/// Unbounded normal altitude distribution.
#[derive(Debug, Clone, Copy)]
pub struct Normal {
    mean_m: f64,
    sd_m: f64,
}

impl Normal {
    pub fn new(mean_m: f64, sd_m: f64) -> Result<Self, DistributionError> {
        if !sd_m.is_finite() || sd_m <= 0.0 {
            return Err(DistributionError::InvalidSpread(sd_m));
        }
        Ok(Self { mean_m, sd_m })
    }

    pub fn pdf(&self, x_m: f64) -> f64 {
        let z = (x_m - self.mean_m) / self.sd_m;
        (-0.5 * z * z).exp() / (self.sd_m * (2.0 * PI).sqrt())
    }

    pub fn cdf(&self, x_m: f64) -> f64 {
        standard_normal_cdf((x_m - self.mean_m) / self.sd_m)
    }
}

/// Normal distribution truncated to a closed altitude band.
///
/// pdf and cdf are renormalized by the probability mass the parent normal
/// places on the band, so the cdf runs from 0 at the lower bound to 1 at
/// the upper bound.
#[derive(Debug, Clone, Copy)]
pub struct TruncatedNormal {
    parent: Normal,
    lower_m: f64,
    upper_m: f64,
    cdf_at_lower: f64,
    band_mass: f64,
}

impl TruncatedNormal {
    pub fn new(
        mean_m: f64,
        sd_m: f64,
        lower_m: f64,
        upper_m: f64,
    ) -> Result<Self, DistributionError> {
        let parent = Normal::new(mean_m, sd_m)?;
        let (a, b) = standardized_bounds(lower_m, upper_m, mean_m, sd_m);
        let cdf_at_lower = standard_normal_cdf(a);
        let band_mass = standard_normal_cdf(b) - cdf_at_lower;
        if !(band_mass > 0.0) {
            return Err(DistributionError::EmptyTruncation { lower_m, upper_m });
        }
        Ok(Self {
            parent,
            lower_m,
            upper_m,
            cdf_at_lower,
            band_mass,
        })
    }

    pub fn pdf(&self, x_m: f64) -> f64 {
        if x_m < self.lower_m || x_m > self.upper_m {
            return 0.0;
        }
        self.parent.pdf(x_m) / self.band_mass
    }

    pub fn cdf(&self, x_m: f64) -> f64 {
        if x_m <= self.lower_m {
            return 0.0;
        }
        if x_m >= self.upper_m {
            return 1.0;
        }
        (self.parent.cdf(x_m) - self.cdf_at_lower) / self.band_mass
    }
}

/// Express clip bounds in z-units of the parent normal:
/// `a = (lower - mean) / sd`, `b = (upper - mean) / sd`.
pub fn standardized_bounds(lower_m: f64, upper_m: f64, mean_m: f64, sd_m: f64) -> (f64, f64) {
    ((lower_m - mean_m) / sd_m, (upper_m - mean_m) / sd_m)
}

fn standard_normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / SQRT_2))
}

/// UA altitude distribution at the reference operating parameters.
pub fn ua_altitude_distribution() -> Normal {
    Normal {
        mean_m: UA_ALTITUDE_MEAN_M,
        sd_m: UA_ALTITUDE_SD_M,
    }
}

/// GA altitude distribution at the reference parameters, truncated to the
/// UA operating band `[0, z_max_m]`.
pub fn ga_altitude_distribution(z_max_m: f64) -> Result<TruncatedNormal, DistributionError> {
    TruncatedNormal::new(GA_ALTITUDE_MEAN_M, GA_ALTITUDE_SD_M, 0.0, z_max_m)
}
