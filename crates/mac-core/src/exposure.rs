//! Per-cell exposure statistics over the trajectory collection.

use crate::spatial::CellPolygon;
use crate::traffic::TrajectoryCollection;
use crate::units::knots_to_mps;

/// How much GA traffic one cell saw over the observation window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exposure {
    /// Occupancy seconds divided by the window length, dimensionless.
    pub fraction: f64,
    /// Mean GA ground speed over the cell, meters per second.
    pub mean_groundspeed_mps: f64,
}

impl Exposure {
    /// Exposure of a cell no aircraft entered.
    pub const ZERO: Exposure = Exposure {
        fraction: 0.0,
        mean_groundspeed_mps: 0.0,
    };
}

/// Exposure statistics of one cell polygon.
///
/// Each sample inside the polygon counts as one second of occupancy,
/// which is exact at the 1 Hz cadence the collection enforces; seconds an
/// aircraft went unobserved are counted as outside. A cell nothing flew
/// through yields [`Exposure::ZERO`], not an error.
pub fn block_data(
    traffic: &TrajectoryCollection,
    cell: &CellPolygon,
    t_total_s: f64,
) -> Exposure {
    let inside = traffic.samples_inside(cell);
    if inside.is_empty() {
        return Exposure::ZERO;
    }
    let occupancy_s = inside.len() as f64;
    let mean_kt = inside
        .iter()
        .map(|sample| sample.groundspeed_kt)
        .sum::<f64>()
        / occupancy_s;
    Exposure {
        fraction: occupancy_s / t_total_s,
        mean_groundspeed_mps: knots_to_mps(mean_kt),
    }
}
