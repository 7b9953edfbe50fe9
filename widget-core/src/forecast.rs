//! Nearest-period county forecast from the 36-hour forecast dataset.

use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    endpoint::{Endpoint, FORECAST_DATASET},
    error::WidgetError,
    http::HttpClient,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub description: String,
    pub weather_code: u32,
    /// Percent, 0–100.
    pub rain_possibility: u8,
    pub comfortability: String,
}

#[async_trait]
pub trait ForecastSource: Send + Sync + Debug {
    async fn fetch_forecast(&self, city_name: &str) -> Result<Forecast, WidgetError>;
}

#[derive(Debug, Clone)]
pub struct CwaForecastFetcher {
    http: Arc<dyn HttpClient>,
    endpoint: Endpoint,
}

impl CwaForecastFetcher {
    pub fn new(http: Arc<dyn HttpClient>, endpoint: Endpoint) -> Self {
        Self { http, endpoint }
    }
}

#[async_trait]
impl ForecastSource for CwaForecastFetcher {
    async fn fetch_forecast(&self, city_name: &str) -> Result<Forecast, WidgetError> {
        debug!(city = city_name, "fetching forecast");
        let url = self.endpoint.dataset_url(FORECAST_DATASET, city_name);
        let body = self.http.get_json(url).await?;
        parse_forecast(city_name, body)
    }
}

#[derive(Debug, Deserialize)]
struct FcResponse {
    records: FcRecords,
}

#[derive(Debug, Deserialize)]
struct FcRecords {
    #[serde(default)]
    location: Vec<FcLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FcLocation {
    weather_element: Vec<FcElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FcElement {
    element_name: ForecastElement,
    /// Decoded only for the elements we read; others vary per dataset.
    #[serde(default)]
    time: Value,
}

#[derive(Debug, Deserialize)]
struct FcPeriod {
    parameter: FcParameter,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FcParameter {
    parameter_name: String,
    parameter_value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
enum ForecastElement {
    Wx,
    PoP,
    #[serde(rename = "CI")]
    Comfort,
    #[serde(other)]
    Other,
}

impl ForecastElement {
    const REQUIRED: [ForecastElement; 3] =
        [ForecastElement::Wx, ForecastElement::PoP, ForecastElement::Comfort];

    fn code(self) -> &'static str {
        match self {
            ForecastElement::Wx => "Wx",
            ForecastElement::PoP => "PoP",
            ForecastElement::Comfort => "CI",
            ForecastElement::Other => "other",
        }
    }
}

pub(crate) fn parse_forecast(city: &str, body: Value) -> Result<Forecast, WidgetError> {
    let parsed: FcResponse = serde_json::from_value(body)
        .map_err(|e| WidgetError::parse("forecast response", e.to_string()))?;

    let location = parsed
        .records
        .location
        .into_iter()
        .next()
        .ok_or_else(|| WidgetError::NoStationData(city.to_string()))?;

    // Nearest period only.
    let first = |wanted: ForecastElement| {
        location
            .weather_element
            .iter()
            .find(|e| e.element_name == wanted)
            .and_then(|e| e.time.get(0))
    };

    let missing: Vec<&'static str> = ForecastElement::REQUIRED
        .into_iter()
        .filter(|el| first(*el).is_none())
        .map(ForecastElement::code)
        .collect();

    let (Some(wx), Some(pop), Some(ci)) = (
        first(ForecastElement::Wx),
        first(ForecastElement::PoP),
        first(ForecastElement::Comfort),
    ) else {
        return Err(WidgetError::IncompleteForecast(missing));
    };

    let wx = parameter(ForecastElement::Wx, wx)?;
    let pop = parameter(ForecastElement::PoP, pop)?;
    let ci = parameter(ForecastElement::Comfort, ci)?;

    let weather_code = wx
        .parameter_value
        .as_deref()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .ok_or_else(|| WidgetError::parse("forecast response", "Wx has no numeric weather code"))?;

    let rain_possibility = pop
        .parameter_name
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|p| *p <= 100)
        .ok_or_else(|| {
            WidgetError::parse(
                "forecast response",
                format!("PoP '{}' is not a percentage", pop.parameter_name),
            )
        })?;

    Ok(Forecast {
        description: wx.parameter_name,
        weather_code,
        rain_possibility,
        comfortability: ci.parameter_name,
    })
}

fn parameter(element: ForecastElement, period: &Value) -> Result<FcParameter, WidgetError> {
    FcPeriod::deserialize(period)
        .map(|p| p.parameter)
        .map_err(|e| WidgetError::parse("forecast response", format!("{}: {e}", element.code())))
}
