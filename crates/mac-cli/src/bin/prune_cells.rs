//! CLI tool to normalize population counts and drop grid cells with
//! neither population nor exposure.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mac_cli::{cells, driver};

/// Drop annotated cells that carry neither population nor exposure
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Annotated cell collection (GeoJSON from compute_risk)
    #[arg(long)]
    input: PathBuf,

    /// Output path for the pruned collection
    #[arg(long)]
    out: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("prune_cells=info".parse()?)
                .add_directive("mac_cli=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let mut collection = cells::load_cells(&args.input)?;
    let before = collection.features.len();
    let dropped = driver::prune_cells(&mut collection);
    cells::write_cells(&args.out, &collection)?;
    tracing::info!(
        "Kept {}/{} cells ({} dropped) -> {}",
        collection.features.len(),
        before,
        dropped,
        args.out.display()
    );
    Ok(())
}
