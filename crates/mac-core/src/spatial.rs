//! Cell polygon geometry and spatial math.

use thiserror::Error;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Smallest ring area treated as non-degenerate, in squared degrees.
/// Real grid cells are several orders of magnitude above this.
const MIN_RING_AREA_DEG2: f64 = 1e-12;

/// Why a polygon ring was rejected.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("ring has {0} distinct vertices, a polygon needs at least 3")]
    TooFewVertices(usize),
    #[error("ring vertex {0} has a non-finite coordinate")]
    NonFiniteVertex(usize),
    #[error("ring vertices {0} and {1} coincide")]
    RepeatedVertex(usize, usize),
    #[error("ring encloses no area")]
    ZeroArea,
    #[error("ring edges {0} and {1} intersect")]
    SelfIntersecting(usize, usize),
}

/// Axis-aligned bounds of a ring in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }
}

/// Footprint of one grid cell: a simple closed polygon over `[lon, lat]`
/// vertices in degrees.
///
/// The ring is stored open; a GeoJSON-style duplicated closing vertex in
/// the input is accepted and dropped. Construction rejects degenerate and
/// self-intersecting rings so every query downstream can trust the shape.
#[derive(Debug, Clone)]
pub struct CellPolygon {
    ring: Vec<[f64; 2]>,
    bbox: BoundingBox,
}

impl CellPolygon {
    /// Build a cell polygon from a coordinate ring.
    ///
    /// # Arguments
    /// * `coords` - Ring vertices as `[lon, lat]` degrees, open or closed
    pub fn from_ring(coords: &[[f64; 2]]) -> Result<Self, GeometryError> {
        let mut ring = coords.to_vec();
        if ring.len() >= 2 && ring.first() == ring.last() {
            ring.pop();
        }

        for (i, vertex) in ring.iter().enumerate() {
            if !vertex[0].is_finite() || !vertex[1].is_finite() {
                return Err(GeometryError::NonFiniteVertex(i));
            }
        }
        if ring.len() < 3 {
            return Err(GeometryError::TooFewVertices(ring.len()));
        }
        for i in 0..ring.len() {
            let j = (i + 1) % ring.len();
            if ring[i] == ring[j] {
                return Err(GeometryError::RepeatedVertex(i, j));
            }
        }
        if ring_area_deg2(&ring).abs() < MIN_RING_AREA_DEG2 {
            return Err(GeometryError::ZeroArea);
        }

        // Non-adjacent edge pairs must not touch. Adjacent edges share a
        // vertex by construction and are skipped.
        let n = ring.len();
        for i in 0..n {
            for j in (i + 2)..n {
                if i == 0 && j == n - 1 {
                    continue;
                }
                let a1 = ring[i];
                let a2 = ring[(i + 1) % n];
                let b1 = ring[j];
                let b2 = ring[(j + 1) % n];
                if segments_intersect(a1, a2, b1, b2) {
                    return Err(GeometryError::SelfIntersecting(i, j));
                }
            }
        }

        let bbox = ring_bounds(&ring);
        Ok(Self { ring, bbox })
    }

    /// The open vertex ring, `[lon, lat]` degrees.
    pub fn ring(&self) -> &[[f64; 2]] {
        &self.ring
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }

    /// Whether the point lies inside the polygon.
    ///
    /// Ray casting over the ring edges; points exactly on an edge fall on
    /// one side or the other, which is acceptable for exposure counting
    /// since the cells tile the area without overlap.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        if !self.bbox.contains(lon, lat) {
            return false;
        }
        let ring = &self.ring;
        let mut inside = false;
        let mut j = ring.len() - 1;
        for i in 0..ring.len() {
            let (xi, yi) = (ring[i][0], ring[i][1]);
            let (xj, yj) = (ring[j][0], ring[j][1]);
            if ((yi > lat) != (yj > lat)) && (lon < (xj - xi) * (lat - yi) / (yj - yi) + xi) {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

/// Signed ring area by the shoelace formula, in squared degrees.
fn ring_area_deg2(ring: &[[f64; 2]]) -> f64 {
    let n = ring.len();
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += ring[i][0] * ring[j][1] - ring[j][0] * ring[i][1];
    }
    sum / 2.0
}

fn ring_bounds(ring: &[[f64; 2]]) -> BoundingBox {
    let mut bbox = BoundingBox {
        min_lon: f64::INFINITY,
        min_lat: f64::INFINITY,
        max_lon: f64::NEG_INFINITY,
        max_lat: f64::NEG_INFINITY,
    };
    for vertex in ring {
        bbox.min_lon = bbox.min_lon.min(vertex[0]);
        bbox.max_lon = bbox.max_lon.max(vertex[0]);
        bbox.min_lat = bbox.min_lat.min(vertex[1]);
        bbox.max_lat = bbox.max_lat.max(vertex[1]);
    }
    bbox
}

fn orient(p: [f64; 2], q: [f64; 2], r: [f64; 2]) -> f64 {
    (q[0] - p[0]) * (r[1] - p[1]) - (q[1] - p[1]) * (r[0] - p[0])
}

fn on_segment(p: [f64; 2], q: [f64; 2], r: [f64; 2]) -> bool {
    r[0] >= p[0].min(q[0])
        && r[0] <= p[0].max(q[0])
        && r[1] >= p[1].min(q[1])
        && r[1] <= p[1].max(q[1])
}

/// Whether two segments touch or cross, endpoints and collinear overlap
/// included. Orientation tests on raw degree coordinates.
fn segments_intersect(a1: [f64; 2], a2: [f64; 2], b1: [f64; 2], b2: [f64; 2]) -> bool {
    let o1 = orient(a1, a2, b1);
    let o2 = orient(a1, a2, b2);
    let o3 = orient(b1, b2, a1);
    let o4 = orient(b1, b2, a2);

    if o1 == 0.0 && on_segment(a1, a2, b1) {
        return true;
    }
    if o2 == 0.0 && on_segment(a1, a2, b2) {
        return true;
    }
    if o3 == 0.0 && on_segment(b1, b2, a1) {
        return true;
    }
    if o4 == 0.0 && on_segment(b1, b2, a2) {
        return true;
    }

    ((o1 > 0.0) != (o2 > 0.0)) && ((o3 > 0.0) != (o4 > 0.0))
}

/// Calculate distance between two points in meters using Haversine formula.
///
/// This is the standard formula for calculating great-circle distance
/// between two points on a sphere given their latitudes and longitudes.
///
/// # Arguments
/// * `lat1`, `lon1` - First point coordinates in decimal degrees
/// * `lat2`, `lon2` - Second point coordinates in decimal degrees
///
/// # Returns
/// Distance in meters
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Vec<[f64; 2]> {
        vec![[17.0, 59.0], [17.01, 59.0], [17.01, 59.01], [17.0, 59.01]]
    }

    #[test]
    fn test_haversine_known_distance() {
        // ~111km between these points (1 degree latitude)
        let dist = haversine_distance(0.0, 0.0, 1.0, 0.0);
        assert!((dist - 111_194.0).abs() < 100.0);
    }

    #[test]
    fn test_haversine_same_point() {
        let dist = haversine_distance(59.6519, 17.9186, 59.6519, 17.9186);
        assert!(dist < 0.001);
    }

    #[test]
    fn accepts_open_and_closed_rings() {
        let open = CellPolygon::from_ring(&unit_square()).unwrap();

        let mut closed_coords = unit_square();
        closed_coords.push(closed_coords[0]);
        let closed = CellPolygon::from_ring(&closed_coords).unwrap();

        assert_eq!(open.ring(), closed.ring());
        assert_eq!(open.bounding_box(), closed.bounding_box());
    }

    #[test]
    fn contains_point_inside_and_outside() {
        let cell = CellPolygon::from_ring(&unit_square()).unwrap();
        assert!(cell.contains(17.005, 59.005));
        assert!(!cell.contains(17.02, 59.005));
        assert!(!cell.contains(17.005, 58.99));
    }

    #[test]
    fn rejects_short_ring() {
        let err = CellPolygon::from_ring(&[[0.0, 0.0], [1.0, 1.0]]).unwrap_err();
        assert_eq!(err, GeometryError::TooFewVertices(2));

        // A closed two-vertex ring collapses to 2 after dropping the closer.
        let err = CellPolygon::from_ring(&[[0.0, 0.0], [1.0, 1.0], [0.0, 0.0]]).unwrap_err();
        assert_eq!(err, GeometryError::TooFewVertices(2));
    }

    #[test]
    fn rejects_non_finite_vertex() {
        let err =
            CellPolygon::from_ring(&[[0.0, 0.0], [1.0, f64::NAN], [1.0, 1.0]]).unwrap_err();
        assert_eq!(err, GeometryError::NonFiniteVertex(1));
    }

    #[test]
    fn rejects_repeated_vertex() {
        let err = CellPolygon::from_ring(&[[0.0, 0.0], [1.0, 0.0], [1.0, 0.0], [1.0, 1.0]])
            .unwrap_err();
        assert_eq!(err, GeometryError::RepeatedVertex(1, 2));
    }

    #[test]
    fn rejects_collinear_ring() {
        let err = CellPolygon::from_ring(&[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]]).unwrap_err();
        assert_eq!(err, GeometryError::ZeroArea);
    }

    #[test]
    fn rejects_bowtie() {
        // Lopsided hourglass: net area is nonzero, edges 0 and 2 cross.
        let err = CellPolygon::from_ring(&[[0.0, 0.0], [2.0, 2.0], [2.0, 0.0], [0.0, 1.0]])
            .unwrap_err();
        assert_eq!(err, GeometryError::SelfIntersecting(0, 2));
    }

    #[test]
    fn segments_intersect_detects_crossing_and_touching() {
        // X crossing
        assert!(segments_intersect(
            [0.0, 0.0],
            [1.0, 1.0],
            [0.0, 1.0],
            [1.0, 0.0]
        ));
        // Shared endpoint counts as touching
        assert!(segments_intersect(
            [0.0, 0.0],
            [1.0, 0.0],
            [1.0, 0.0],
            [2.0, 1.0]
        ));
        // Parallel, apart
        assert!(!segments_intersect(
            [0.0, 0.0],
            [1.0, 0.0],
            [0.0, 1.0],
            [1.0, 1.0]
        ));
        // Collinear, disjoint
        assert!(!segments_intersect(
            [0.0, 0.0],
            [1.0, 0.0],
            [2.0, 0.0],
            [3.0, 0.0]
        ));
    }
}
