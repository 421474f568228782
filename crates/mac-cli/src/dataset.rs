//! The trajectory dataset file: one CSV row per sample.

use std::path::Path;

use anyhow::{Context, Result};

use mac_core::TrajectorySample;

/// Load the prepared trajectory dataset.
///
/// The file is expected to already be cleaned, resampled to 1 Hz and
/// altitude-filtered by `fetch_traffic`; the cadence is re-checked when
/// the samples go into a `TrajectoryCollection`.
pub fn load_samples(path: &Path) -> Result<Vec<TrajectorySample>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open trajectory dataset {}", path.display()))?;
    let mut samples = Vec::new();
    for row in reader.deserialize() {
        let sample: TrajectorySample = row
            .with_context(|| format!("Malformed row in trajectory dataset {}", path.display()))?;
        samples.push(sample);
    }
    Ok(samples)
}

/// Write the prepared trajectory dataset.
pub fn write_samples(path: &Path, samples: &[TrajectorySample]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create trajectory dataset {}", path.display()))?;
    for sample in samples {
        writer.serialize(sample)?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush trajectory dataset {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use tempfile::tempdir;

    #[test]
    fn dataset_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flights_data.csv");

        let samples = vec![
            TrajectorySample {
                timestamp: DateTime::from_timestamp(1_683_000_000, 0).unwrap(),
                icao24: "4ac9e5".to_string(),
                lat: 59.65,
                lon: 17.92,
                altitude_m: 457.2,
                groundspeed_kt: 92.0,
            },
            TrajectorySample {
                timestamp: DateTime::from_timestamp(1_683_000_001, 0).unwrap(),
                icao24: "4ac9e5".to_string(),
                lat: 59.651,
                lon: 17.921,
                altitude_m: 460.0,
                groundspeed_kt: 93.5,
            },
        ];

        write_samples(&path, &samples).unwrap();
        let back = load_samples(&path).unwrap();
        assert_eq!(back, samples);
    }

    #[test]
    fn malformed_rows_are_reported_with_the_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.csv");
        std::fs::write(
            &path,
            "timestamp,icao24,lat,lon,altitude_m,groundspeed_kt\nnot-a-time,4ac9e5,59.0,17.0,100.0,90.0\n",
        )
        .unwrap();

        let err = load_samples(&path).unwrap_err();
        assert!(format!("{err}").contains("broken.csv"));
    }
}
