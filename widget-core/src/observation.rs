//! Current conditions from the station observation dataset.

use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Asia::Taipei;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    endpoint::{Endpoint, OBSERVATION_DATASET},
    error::WidgetError,
    http::HttpClient,
};

/// CWA reports this value when a sensor has no reading.
const MISSING_SENTINEL: f64 = -99.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Station name as reported by the endpoint.
    pub location_name: String,
    /// m/s
    pub wind_speed: f64,
    /// °C
    pub temperature: f64,
    /// When the station took the reading.
    pub observation_time: DateTime<Utc>,
}

#[async_trait]
pub trait ObservationSource: Send + Sync + Debug {
    async fn fetch_observation(&self, location_name: &str) -> Result<Observation, WidgetError>;
}

#[derive(Debug, Clone)]
pub struct CwaObservationFetcher {
    http: Arc<dyn HttpClient>,
    endpoint: Endpoint,
}

impl CwaObservationFetcher {
    pub fn new(http: Arc<dyn HttpClient>, endpoint: Endpoint) -> Self {
        Self { http, endpoint }
    }
}

#[async_trait]
impl ObservationSource for CwaObservationFetcher {
    async fn fetch_observation(&self, location_name: &str) -> Result<Observation, WidgetError> {
        debug!(station = location_name, "fetching observation");
        let url = self.endpoint.dataset_url(OBSERVATION_DATASET, location_name);
        let body = self.http.get_json(url).await?;
        parse_observation(location_name, body)
    }
}

#[derive(Debug, Deserialize)]
struct ObsResponse {
    records: ObsRecords,
}

#[derive(Debug, Deserialize)]
struct ObsRecords {
    #[serde(default)]
    location: Vec<ObsLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObsLocation {
    location_name: String,
    time: ObsTime,
    weather_element: Vec<ObsElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObsTime {
    obs_time: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObsElement {
    element_name: ObservationElement,
    /// Kept raw: stations report many elements we never read, in any shape.
    #[serde(default)]
    element_value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
enum ObservationElement {
    #[serde(rename = "WDSD")]
    WindSpeed,
    #[serde(rename = "TEMP")]
    Temperature,
    #[serde(other)]
    Other,
}

impl ObservationElement {
    const REQUIRED: [ObservationElement; 2] =
        [ObservationElement::WindSpeed, ObservationElement::Temperature];

    fn code(self) -> &'static str {
        match self {
            ObservationElement::WindSpeed => "WDSD",
            ObservationElement::Temperature => "TEMP",
            ObservationElement::Other => "other",
        }
    }
}

/// Element values come as numbers, numeric strings or `{ "value": .. }`.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Object(map) => map.get("value").and_then(numeric),
        _ => None,
    }
}

pub(crate) fn parse_observation(station: &str, body: Value) -> Result<Observation, WidgetError> {
    let parsed: ObsResponse = serde_json::from_value(body)
        .map_err(|e| WidgetError::parse("observation response", e.to_string()))?;

    let location = parsed
        .records
        .location
        .into_iter()
        .next()
        .ok_or_else(|| WidgetError::NoStationData(station.to_string()))?;

    let missing: Vec<&'static str> = ObservationElement::REQUIRED
        .into_iter()
        .filter(|wanted| !location.weather_element.iter().any(|e| e.element_name == *wanted))
        .map(ObservationElement::code)
        .collect();
    if !missing.is_empty() {
        return Err(WidgetError::IncompleteObservation(missing));
    }

    let wind_speed = element(&location.weather_element, ObservationElement::WindSpeed)?;
    let temperature = element(&location.weather_element, ObservationElement::Temperature)?;
    let observation_time = parse_obs_time(&location.time.obs_time)?;

    Ok(Observation {
        location_name: location.location_name,
        wind_speed,
        temperature,
        observation_time,
    })
}

fn element(elements: &[ObsElement], wanted: ObservationElement) -> Result<f64, WidgetError> {
    let raw = elements
        .iter()
        .find(|e| e.element_name == wanted)
        .ok_or_else(|| WidgetError::IncompleteObservation(vec![wanted.code()]))?;

    let value = numeric(&raw.element_value).ok_or_else(|| {
        WidgetError::parse(
            "observation response",
            format!("element {} is not numeric", wanted.code()),
        )
    })?;

    if !value.is_finite() {
        return Err(WidgetError::parse(
            "observation response",
            format!("element {} is not a finite number", wanted.code()),
        ));
    }

    if value == MISSING_SENTINEL {
        return Err(WidgetError::parse(
            "observation response",
            format!("element {} has no reading", wanted.code()),
        ));
    }

    Ok(value)
}

/// RFC 3339, or `YYYY-MM-DD HH:MM:SS` in Taiwan local time.
fn parse_obs_time(raw: &str) -> Result<DateTime<Utc>, WidgetError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .and_then(|naive| Taipei.from_local_datetime(&naive).single())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| WidgetError::parse("observation time", format!("unrecognised '{raw}'")))
}
