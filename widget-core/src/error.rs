use chrono::NaiveDate;
use thiserror::Error;

/// Failures surfaced by the resolver, the moment calculator and the fetch cycle.
#[derive(Debug, Clone, Error)]
pub enum WidgetError {
    #[error("Unsupported city '{0}'. Run `weather-widget cities` to list supported cities.")]
    UnknownCity(String),

    #[error("No sunrise/sunset data for '{city}' on {date}")]
    NoSunriseData { city: String, date: NaiveDate },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to parse {what}: {message}")]
    Parse { what: &'static str, message: String },

    #[error("No station data returned for '{0}'")]
    NoStationData(String),

    #[error("Observation is missing required elements: {}", .0.join(", "))]
    IncompleteObservation(Vec<&'static str>),

    #[error("Forecast is missing required elements: {}", .0.join(", "))]
    IncompleteForecast(Vec<&'static str>),

    #[error("Both fetches failed. Observation: {observation}; forecast: {forecast}")]
    Both {
        observation: Box<WidgetError>,
        forecast: Box<WidgetError>,
    },

    #[error("Invalid sunrise table: {0}")]
    InvalidSunriseTable(String),
}

impl WidgetError {
    pub(crate) fn parse(what: &'static str, message: impl Into<String>) -> Self {
        WidgetError::Parse {
            what,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for WidgetError {
    fn from(err: reqwest::Error) -> Self {
        WidgetError::Transport(err.to_string())
    }
}
