//! The grid cell file: a GeoJSON FeatureCollection of population cells.
//!
//! Only the members the pipeline works with are typed; everything else
//! (foreign members, unknown properties, CRS blocks) rides along in
//! flattened maps and survives a load/annotate/write cycle untouched.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write as _};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Property names carrying the population count across source variants.
pub const POPULATION_SOURCE_KEYS: [&str; 2] = ["Totalt", "TotBef"];

/// Output property names.
pub const POPULATION_KEY: &str = "B";
pub const EXPOSURE_KEY: &str = "T";
pub const SPEED_KEY: &str = "v";
pub const PROBABILITY_KEY: &str = "p";

/// GeoJSON FeatureCollection of grid cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<CellFeature>,
    #[serde(flatten)]
    pub foreign: Map<String, Value>,
}

/// One grid cell feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellFeature {
    #[serde(rename = "type")]
    pub kind: String,
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(flatten)]
    pub foreign: Map<String, Value>,
}

/// Cell geometry. The risk model reads the outer ring only; interior
/// rings and additional polygons are carried through for the output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
}

impl Geometry {
    /// Outer ring of the first polygon, `[lon, lat]` degrees.
    pub fn outer_ring(&self) -> Option<&[[f64; 2]]> {
        match self {
            Geometry::Polygon { coordinates } => coordinates.first().map(Vec::as_slice),
            Geometry::MultiPolygon { coordinates } => coordinates
                .first()
                .and_then(|polygon| polygon.first())
                .map(Vec::as_slice),
        }
    }
}

pub fn load_cells(path: &Path) -> Result<CellCollection> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open cell collection {}", path.display()))?;
    let collection: CellCollection = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse cell collection {}", path.display()))?;
    Ok(collection)
}

/// Write the collection. Object keys serialize in sorted order, so the
/// same collection always produces byte-identical output.
pub fn write_cells(path: &Path, collection: &CellCollection) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create cell collection {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, collection)
        .with_context(|| format!("Failed to write cell collection {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush cell collection {}", path.display()))?;
    Ok(())
}

/// Move the population count to its output name `B`, whichever source
/// variant carries it.
pub fn rename_population(properties: &mut Map<String, Value>) {
    for key in POPULATION_SOURCE_KEYS {
        if let Some(value) = properties.remove(key) {
            properties.insert(POPULATION_KEY.to_string(), value);
            return;
        }
    }
}
