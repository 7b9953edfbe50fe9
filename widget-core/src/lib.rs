//! Core library for the `weather-widget` dashboard.
//!
//! This crate defines:
//! - City resolution into observation, forecast and sunrise identifiers
//! - Day/night context from a static sunrise/sunset table
//! - Observation and forecast fetchers over a pluggable HTTP client
//! - The aggregator that merges both feeds into one published snapshot
//! - Configuration, credentials & the preferred-city store
//!
//! It is used by `weather-widget`, but can also be reused by other front ends.

pub mod aggregator;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod forecast;
pub mod http;
pub mod location;
pub mod moment;
pub mod observation;
pub mod sunrise;

pub use aggregator::{CycleOutcome, SnapshotStatus, WeatherAggregator, WeatherReport, WeatherSnapshot};
pub use config::{Config, MemoryPreferences, PreferenceStore, preferred_city, remember_city};
pub use endpoint::Endpoint;
pub use error::WidgetError;
pub use forecast::{CwaForecastFetcher, Forecast, ForecastSource};
pub use http::{HttpClient, ReqwestClient};
pub use location::{CityIdentifiers, DEFAULT_CITY, resolve, supported_cities};
pub use moment::{Moment, Theme, moment, moment_for};
pub use observation::{CwaObservationFetcher, Observation, ObservationSource};
pub use sunrise::{SunriseRecord, SunriseTable};
