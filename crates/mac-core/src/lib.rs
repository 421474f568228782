pub mod altitude;
pub mod constants;
pub mod exposure;
pub mod models;
pub mod quadrature;
pub mod risk;
pub mod spatial;
pub mod traffic;
pub mod units;

pub use altitude::{
    ga_altitude_distribution, ua_altitude_distribution, DistributionError, Normal,
    TruncatedNormal,
};
pub use constants::{ConstantsError, RiskConstants};
pub use exposure::{block_data, Exposure};
pub use models::TrajectorySample;
pub use quadrature::{integrate, QuadratureError};
pub use risk::{round_probability, CellRisk, RiskError, RiskModel};
pub use spatial::{haversine_distance, CellPolygon, GeometryError};
pub use traffic::{
    filter_below_ceiling, resample_1hz, TrafficError, TrajectoryCollection,
    ALTITUDE_CEILING_M, DEFAULT_RESAMPLE_MAX_GAP_S,
};
