//! Concurrent observation + forecast fetch, merged into one published snapshot.
//!
//! State lives in a single `watch` cell per aggregator. Every refresh starts a
//! new cycle with a monotonically increasing id; a cycle publishes only if no
//! newer cycle has started in the meantime, so late responses from superseded
//! cycles are dropped instead of overwriting fresher data.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    endpoint::Endpoint,
    error::WidgetError,
    forecast::{CwaForecastFetcher, Forecast, ForecastSource},
    http::HttpClient,
    location::CityIdentifiers,
    observation::{CwaObservationFetcher, Observation, ObservationSource},
};

/// One complete merge of an observation and a forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub location_name: String,
    pub description: String,
    pub weather_code: u32,
    pub comfortability: String,
    pub wind_speed: f64,
    pub temperature: f64,
    pub rain_possibility: u8,
    pub observation_time: DateTime<Utc>,
}

impl WeatherReport {
    pub fn merge(observation: Observation, forecast: Forecast) -> Self {
        Self {
            location_name: observation.location_name,
            description: forecast.description,
            weather_code: forecast.weather_code,
            comfortability: forecast.comfortability,
            wind_speed: observation.wind_speed,
            temperature: observation.temperature,
            rain_possibility: forecast.rain_possibility,
            observation_time: observation.observation_time,
        }
    }

    /// Temperature rounded for display.
    pub fn rounded_temperature(&self) -> i64 {
        self.temperature.round() as i64
    }
}

/// What subscribers see.
#[derive(Debug, Clone, Default)]
pub struct WeatherSnapshot {
    /// Last successful merge, kept while a newer cycle loads or after it fails.
    pub report: Option<WeatherReport>,
    pub is_loading: bool,
    /// Failure of the latest completed cycle; cleared on success.
    pub last_error: Option<WidgetError>,
    /// Id of the most recently started cycle.
    pub cycle: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotStatus {
    /// Nothing requested yet.
    Idle,
    Loading,
    Ready,
    /// Latest cycle failed; `report` holds older data.
    FailedStale,
    /// Latest cycle failed and nothing was ever loaded.
    FailedEmpty,
}

impl WeatherSnapshot {
    pub fn status(&self) -> SnapshotStatus {
        match (self.is_loading, &self.last_error, &self.report) {
            (true, _, _) => SnapshotStatus::Loading,
            (false, Some(_), Some(_)) => SnapshotStatus::FailedStale,
            (false, Some(_), None) => SnapshotStatus::FailedEmpty,
            (false, None, Some(_)) => SnapshotStatus::Ready,
            (false, None, None) => SnapshotStatus::Idle,
        }
    }
}

/// How a refresh cycle ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Published(WeatherReport),
    /// A newer cycle started before this one finished; its result was dropped.
    Superseded,
}

#[derive(Debug)]
pub struct WeatherAggregator {
    identifiers: CityIdentifiers,
    observation: Arc<dyn ObservationSource>,
    forecast: Arc<dyn ForecastSource>,
    state: watch::Sender<WeatherSnapshot>,
}

impl WeatherAggregator {
    pub fn new(
        identifiers: CityIdentifiers,
        observation: Arc<dyn ObservationSource>,
        forecast: Arc<dyn ForecastSource>,
    ) -> Self {
        let (state, _) = watch::channel(WeatherSnapshot::default());
        Self {
            identifiers,
            observation,
            forecast,
            state,
        }
    }

    /// Aggregator backed by the CWA open-data endpoints.
    pub fn cwa(identifiers: CityIdentifiers, endpoint: Endpoint, http: Arc<dyn HttpClient>) -> Self {
        Self::new(
            identifiers,
            Arc::new(CwaObservationFetcher::new(http.clone(), endpoint.clone())),
            Arc::new(CwaForecastFetcher::new(http, endpoint)),
        )
    }

    pub fn identifiers(&self) -> &CityIdentifiers {
        &self.identifiers
    }

    pub fn snapshot(&self) -> WeatherSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WeatherSnapshot> {
        self.state.subscribe()
    }

    /// Run one fetch cycle.
    ///
    /// Safe to call while an earlier cycle is still in flight; only the most
    /// recently started cycle may publish.
    pub async fn refresh(&self) -> Result<CycleOutcome, WidgetError> {
        let mut cycle = 0;
        self.state.send_modify(|s| {
            s.cycle += 1;
            s.is_loading = true;
            cycle = s.cycle;
        });

        let ids = &self.identifiers;
        debug!(cycle, city = ids.city_name, station = ids.location_name, "refresh started");

        let (observation, forecast) = tokio::join!(
            self.observation.fetch_observation(ids.location_name),
            self.forecast.fetch_forecast(ids.city_name),
        );

        let merged = match (observation, forecast) {
            (Ok(o), Ok(f)) => Ok(WeatherReport::merge(o, f)),
            (Err(e), Ok(_)) | (Ok(_), Err(e)) => Err(e),
            (Err(o), Err(f)) => Err(WidgetError::Both {
                observation: Box::new(o),
                forecast: Box::new(f),
            }),
        };

        let published = self.state.send_if_modified(|s| {
            if s.cycle != cycle {
                return false;
            }
            s.is_loading = false;
            match &merged {
                Ok(report) => {
                    s.report = Some(report.clone());
                    s.last_error = None;
                }
                Err(err) => s.last_error = Some(err.clone()),
            }
            true
        });

        if !published {
            match &merged {
                Ok(_) => debug!(cycle, "dropping result of superseded cycle"),
                Err(err) => warn!(cycle, error = %err, "superseded cycle failed"),
            }
            return Ok(CycleOutcome::Superseded);
        }

        match merged {
            Ok(report) => {
                info!(cycle, city = ids.city_name, "weather snapshot published");
                Ok(CycleOutcome::Published(report))
            }
            Err(err) => {
                warn!(cycle, city = ids.city_name, error = %err, "refresh failed");
                Err(err)
            }
        }
    }
}
