//! CLI tool to annotate every grid cell with GA exposure and midair
//! collision probability.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mac_cli::{cells, dataset, driver};
use mac_core::{RiskConstants, RiskModel, TrajectoryCollection};

/// Annotate grid cells with exposure and collision probability
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Prepared trajectory dataset (CSV from fetch_traffic)
    #[arg(long)]
    dataset: PathBuf,

    /// Grid cell collection to annotate (GeoJSON)
    #[arg(long)]
    cells: PathBuf,

    /// Output path for the annotated collection
    #[arg(long)]
    out: PathBuf,

    /// Risk constants file (JSON); omitted fields keep reference values
    #[arg(long)]
    constants: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("compute_risk=info".parse()?)
                .add_directive("mac_cli=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let constants = match &args.constants {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read constants {}", path.display()))?;
            let constants: RiskConstants = serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse constants {}", path.display()))?;
            constants
                .validate()
                .with_context(|| format!("Constants file {} is unusable", path.display()))?;
            constants
        }
        None => RiskConstants::default(),
    };

    let samples = dataset::load_samples(&args.dataset)?;
    let traffic = TrajectoryCollection::new(samples)
        .with_context(|| format!("Trajectory dataset {} is unusable", args.dataset.display()))?;
    tracing::info!("Loaded {} trajectory samples", traffic.len());

    let mut collection = cells::load_cells(&args.cells)?;
    tracing::info!("Loaded {} cell features", collection.features.len());

    let model = RiskModel::new(constants);
    driver::annotate_cells(&mut collection, &traffic, &model)?;

    cells::write_cells(&args.out, &collection)?;
    tracing::info!(
        "Annotated {} cells -> {}",
        collection.features.len(),
        args.out.display()
    );
    Ok(())
}
