//! OpenSky Network REST client.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use mac_core::TrajectorySample;

use crate::backoff::Backoff;
use crate::models::{FlightSummary, FlightTrack};
use crate::track::track_to_samples;

/// Public OpenSky REST API root.
pub const DEFAULT_BASE_URL: &str = "https://opensky-network.org/api";

/// Environment variables carrying optional OpenSky credentials.
pub const USERNAME_ENV: &str = "OPENSKY_USERNAME";
pub const PASSWORD_ENV: &str = "OPENSKY_PASSWORD";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
const RETRY_MAX_DELAY: Duration = Duration::from_secs(30);
/// Attempts per request before a transient failure becomes fatal.
const MAX_ATTEMPTS: u32 = 4;

#[derive(Debug, Error)]
pub enum OpenSkyError {
    #[error("window begin {begin} is not before end {end}")]
    EmptyWindow { begin: i64, end: i64 },
    #[error("request to {endpoint} failed")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
    #[error("failed to decode response from {endpoint}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} still failing after {attempts} attempts")]
    RetriesExhausted { endpoint: String, attempts: u32 },
    #[error("fetch task for {airport} panicked")]
    Task { airport: String },
}

/// Unix-second window for flight enumeration, begin strictly before end.
#[derive(Debug, Clone, Copy)]
pub struct TimeWindow {
    begin: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(begin: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, OpenSkyError> {
        if begin >= end {
            return Err(OpenSkyError::EmptyWindow {
                begin: begin.timestamp(),
                end: end.timestamp(),
            });
        }
        Ok(Self { begin, end })
    }

    pub fn begin_unix(&self) -> i64 {
        self.begin.timestamp()
    }

    pub fn end_unix(&self) -> i64 {
        self.end.timestamp()
    }
}

/// HTTP client for the OpenSky Network REST API.
///
/// Anonymous access works with tighter rate limits; registered
/// credentials can be picked up from the environment.
#[derive(Clone)]
pub struct OpenSkyClient {
    client: Client,
    base_url: String,
    credentials: Option<(String, String)>,
}

impl OpenSkyClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.into(),
            credentials: None,
        }
    }

    /// Pick up `OPENSKY_USERNAME` / `OPENSKY_PASSWORD` when both are set.
    pub fn with_env_credentials(self) -> Self {
        match (std::env::var(USERNAME_ENV), std::env::var(PASSWORD_ENV)) {
            (Ok(username), Ok(password)) => self.with_credentials(username, password),
            _ => self,
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Fetch the full GA history for a set of airports over one window.
    ///
    /// Airports are fetched concurrently, one task each, and the samples
    /// concatenated. Any airport failing fails the whole fetch; partial
    /// histories would silently undercount exposure downstream.
    pub async fn fetch_history(
        &self,
        airports: &[String],
        window: TimeWindow,
    ) -> Result<Vec<TrajectorySample>, OpenSkyError> {
        let mut handles = Vec::with_capacity(airports.len());
        for airport in airports {
            let client = self.clone();
            let airport = airport.clone();
            let task_airport = airport.clone();
            handles.push((
                airport,
                tokio::spawn(async move {
                    client.fetch_airport_history(&task_airport, window).await
                }),
            ));
        }

        let mut samples = Vec::new();
        for (airport, handle) in handles {
            let airport_samples = handle
                .await
                .map_err(|_| OpenSkyError::Task { airport })??;
            samples.extend(airport_samples);
        }
        Ok(samples)
    }

    /// Departures plus arrivals of one airport, with the waypoint track of
    /// every flight converted to samples.
    async fn fetch_airport_history(
        &self,
        airport: &str,
        window: TimeWindow,
    ) -> Result<Vec<TrajectorySample>, OpenSkyError> {
        let mut flights = self.flights("departure", airport, window).await?;
        flights.extend(self.flights("arrival", airport, window).await?);
        // A flight can appear on both lists; fetch its track once.
        flights.sort_by(|a, b| {
            (a.icao24.as_str(), a.first_seen).cmp(&(b.icao24.as_str(), b.first_seen))
        });
        flights.dedup_by(|a, b| a.icao24 == b.icao24 && a.first_seen == b.first_seen);
        tracing::info!("{}: {} flights in window", airport, flights.len());

        let mut samples = Vec::new();
        let mut missing_tracks = 0usize;
        for flight in &flights {
            match self.track(&flight.icao24, flight.first_seen).await? {
                Some(track) => samples.extend(track_to_samples(&track)),
                None => missing_tracks += 1,
            }
        }
        if missing_tracks > 0 {
            tracing::warn!(
                "{}: no track held for {} of {} flights",
                airport,
                missing_tracks,
                flights.len()
            );
        }
        tracing::info!("{}: {} trajectory samples", airport, samples.len());
        Ok(samples)
    }

    /// One flight list endpoint. OpenSky answers 404 when the window holds
    /// no flights at all, so that maps to an empty list.
    async fn flights(
        &self,
        direction: &str,
        airport: &str,
        window: TimeWindow,
    ) -> Result<Vec<FlightSummary>, OpenSkyError> {
        let endpoint = format!("{}/flights/{}", self.base_url, direction);
        let query = [
            ("airport", airport.to_string()),
            ("begin", window.begin_unix().to_string()),
            ("end", window.end_unix().to_string()),
        ];
        Ok(self
            .get_json::<Vec<FlightSummary>>(&endpoint, &query)
            .await?
            .unwrap_or_default())
    }

    /// Waypoint track of one flight. 404 means OpenSky holds no track.
    async fn track(&self, icao24: &str, time: i64) -> Result<Option<FlightTrack>, OpenSkyError> {
        let endpoint = format!("{}/tracks/all", self.base_url);
        let query = [
            ("icao24", icao24.to_string()),
            ("time", time.to_string()),
        ];
        self.get_json::<FlightTrack>(&endpoint, &query).await
    }

    /// GET with bounded retry, decoding the JSON body. `Ok(None)` on 404,
    /// retries on 429 and server errors, everything else is fatal.
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, OpenSkyError> {
        let mut backoff = Backoff::new(RETRY_BASE_DELAY, RETRY_MAX_DELAY);
        for attempt in 1..=MAX_ATTEMPTS {
            let mut request = self.client.get(endpoint).query(query);
            if let Some((username, password)) = &self.credentials {
                request = request.basic_auth(username, Some(password));
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::NOT_FOUND {
                        return Ok(None);
                    }
                    if status.is_success() {
                        let payload =
                            response.json::<T>().await.map_err(|source| {
                                OpenSkyError::Decode {
                                    endpoint: endpoint.to_string(),
                                    source,
                                }
                            })?;
                        return Ok(Some(payload));
                    }
                    if !is_transient(status) {
                        let body = response.text().await.unwrap_or_default();
                        return Err(OpenSkyError::Status {
                            endpoint: endpoint.to_string(),
                            status: status.as_u16(),
                            body,
                        });
                    }
                    tracing::warn!(
                        "{} returned HTTP {}, attempt {}/{}",
                        endpoint,
                        status.as_u16(),
                        attempt,
                        MAX_ATTEMPTS
                    );
                }
                Err(source) => {
                    if attempt == MAX_ATTEMPTS {
                        return Err(OpenSkyError::Http {
                            endpoint: endpoint.to_string(),
                            source,
                        });
                    }
                    tracing::warn!(
                        "request to {} failed ({}), attempt {}/{}",
                        endpoint,
                        source,
                        attempt,
                        MAX_ATTEMPTS
                    );
                }
            }

            if attempt < MAX_ATTEMPTS {
                tokio::time::sleep(backoff.next_delay()).await;
            }
        }
        Err(OpenSkyError::RetriesExhausted {
            endpoint: endpoint.to_string(),
            attempts: MAX_ATTEMPTS,
        })
    }
}

fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(unix_s: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(unix_s, 0).unwrap()
    }

    #[test]
    fn window_requires_begin_before_end() {
        let window = TimeWindow::new(at(1_683_000_000), at(1_683_604_800)).unwrap();
        assert_eq!(window.begin_unix(), 1_683_000_000);
        assert_eq!(window.end_unix(), 1_683_604_800);

        assert!(matches!(
            TimeWindow::new(at(1_683_000_000), at(1_683_000_000)),
            Err(OpenSkyError::EmptyWindow { .. })
        ));
        assert!(TimeWindow::new(at(2), at(1)).is_err());
    }

    #[test]
    fn transient_statuses() {
        assert!(is_transient(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_transient(StatusCode::BAD_GATEWAY));
        assert!(is_transient(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!is_transient(StatusCode::UNAUTHORIZED));
        assert!(!is_transient(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn explicit_credentials_are_kept() {
        let client = OpenSkyClient::new(DEFAULT_BASE_URL).with_credentials("user", "secret");
        assert_eq!(
            client.credentials,
            Some(("user".to_string(), "secret".to_string()))
        );
    }
}
