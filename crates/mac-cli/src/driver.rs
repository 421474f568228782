//! Batch drivers: per-cell risk annotation and output pruning.

use anyhow::{anyhow, Context, Result};
use serde_json::Value;

use mac_core::spatial::CellPolygon;
use mac_core::{RiskModel, TrajectoryCollection};

use crate::cells::{
    rename_population, CellCollection, EXPOSURE_KEY, POPULATION_KEY, PROBABILITY_KEY, SPEED_KEY,
};

/// Progress log interval in features.
const PROGRESS_EVERY: usize = 100;

/// Annotate every cell feature with `B`, `T`, `v` and `p`.
///
/// A malformed feature or a failed computation aborts the whole run with
/// the feature index in the error; nothing about a bad polygon is
/// transient, and a partially annotated grid must never be written.
pub fn annotate_cells(
    collection: &mut CellCollection,
    traffic: &TrajectoryCollection,
    model: &RiskModel,
) -> Result<()> {
    let total = collection.features.len();
    for (index, feature) in collection.features.iter_mut().enumerate() {
        let ring = feature
            .geometry
            .outer_ring()
            .ok_or_else(|| anyhow!("Feature {} has no polygon ring", index))?;
        let cell = CellPolygon::from_ring(ring)
            .with_context(|| format!("Feature {} has a malformed polygon", index))?;
        let risk = model
            .assess_cell(traffic, &cell)
            .with_context(|| format!("Risk computation failed for feature {}", index))?;

        rename_population(&mut feature.properties);
        feature
            .properties
            .insert(EXPOSURE_KEY.to_string(), Value::from(risk.exposure_fraction));
        feature.properties.insert(
            SPEED_KEY.to_string(),
            Value::from(risk.mean_groundspeed_mps),
        );
        feature.properties.insert(
            PROBABILITY_KEY.to_string(),
            Value::from(risk.collision_probability),
        );

        if (index + 1) % PROGRESS_EVERY == 0 {
            tracing::info!("Annotated {}/{} cells", index + 1, total);
        }
    }
    Ok(())
}

/// Normalize null population counts to 0, then drop every feature with
/// neither population nor exposure. Returns the number dropped.
pub fn prune_cells(collection: &mut CellCollection) -> usize {
    for feature in &mut collection.features {
        if let Some(population) = feature.properties.get_mut(POPULATION_KEY) {
            if population.is_null() {
                *population = Value::from(0);
            }
        }
    }

    let before = collection.features.len();
    collection.features.retain(|feature| {
        property_number(&feature.properties, POPULATION_KEY) > 0.0
            || property_number(&feature.properties, EXPOSURE_KEY) > 0.0
    });
    before - collection.features.len()
}

fn property_number(properties: &serde_json::Map<String, Value>, key: &str) -> f64 {
    properties.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}
