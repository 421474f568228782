//! MAC CLI - Batch tools for the risk grid pipeline.
//!
//! This crate provides the pipeline binaries:
//! - fetch_traffic: download GA history and prepare the trajectory dataset
//! - compute_risk: annotate every grid cell with exposure and collision probability
//! - prune_cells: normalize population counts and drop cells without content
//!
//! The binaries only parse arguments and delegate here, so the whole
//! pipeline is exercisable from tests without a network or a CLI harness.

pub mod cells;
pub mod dataset;
pub mod driver;
