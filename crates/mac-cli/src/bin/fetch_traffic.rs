//! CLI tool to download GA flight history from the OpenSky Network and
//! prepare the trajectory dataset: clean tracks, resample to 1 Hz, drop
//! everything above the altitude ceiling.

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mac_cli::dataset;
use mac_core::traffic::{
    filter_below_ceiling, resample_1hz, ALTITUDE_CEILING_M, DEFAULT_RESAMPLE_MAX_GAP_S,
};
use mac_opensky::{OpenSkyClient, TimeWindow, DEFAULT_BASE_URL};

/// Fetch GA trajectories around airports and persist the prepared dataset
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Airport ICAO codes to fetch departures and arrivals for
    #[arg(long, required = true, value_delimiter = ',')]
    airports: Vec<String>,

    /// Window start, RFC 3339 (e.g. 2023-05-01T00:00:00Z)
    #[arg(long)]
    begin: DateTime<Utc>,

    /// Window end, RFC 3339
    #[arg(long)]
    end: DateTime<Utc>,

    /// Output dataset path
    #[arg(long, default_value = "flights_data.csv")]
    out: PathBuf,

    /// OpenSky API base URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Largest raw gap in seconds to interpolate across
    #[arg(long, default_value_t = DEFAULT_RESAMPLE_MAX_GAP_S)]
    max_gap_s: i64,

    /// Altitude ceiling in meters; samples at or above it are dropped
    #[arg(long, default_value_t = ALTITUDE_CEILING_M)]
    ceiling_m: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fetch_traffic=info".parse()?)
                .add_directive("mac_opensky=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let window = TimeWindow::new(args.begin, args.end)?;
    let client = OpenSkyClient::new(&args.base_url).with_env_credentials();

    tracing::info!(
        "Fetching history for {} airport(s), {} to {}",
        args.airports.len(),
        args.begin,
        args.end
    );
    let raw = client.fetch_history(&args.airports, window).await?;
    tracing::info!("Fetched {} raw samples", raw.len());

    let resampled = resample_1hz(&raw, args.max_gap_s);
    let mut prepared = filter_below_ceiling(resampled, args.ceiling_m);
    prepared.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.icao24.cmp(&b.icao24))
    });
    tracing::info!(
        "Prepared {} samples at 1 Hz below {} m",
        prepared.len(),
        args.ceiling_m
    );

    dataset::write_samples(&args.out, &prepared)?;
    tracing::info!("Wrote {}", args.out.display());
    Ok(())
}
