//! OpenSky Network acquisition for the MAC risk pipeline.
//!
//! Enumerates GA flights per airport (departures and arrivals over a
//! window), pulls each flight's waypoint track, and converts the tracks
//! into trajectory samples ready for 1 Hz resampling.

mod backoff;
pub mod client;
pub mod models;
pub mod track;

pub use client::{OpenSkyClient, OpenSkyError, TimeWindow, DEFAULT_BASE_URL};
pub use models::{FlightSummary, FlightTrack, TrackPoint};
pub use track::track_to_samples;
