//! Plain-text weather card, and the same data as JSON for scripts.

use serde::Serialize;
use weather_widget_core::{
    CityIdentifiers, Moment, SnapshotStatus, Theme, WeatherReport, WeatherSnapshot,
};

#[derive(Debug, Serialize)]
struct CardJson<'a> {
    city: &'a CityIdentifiers,
    theme: Theme,
    report: Option<&'a WeatherReport>,
    observed_local: Option<&'a str>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct MomentJson<'a> {
    city: &'a CityIdentifiers,
    moment: Moment,
    theme: Theme,
}

pub fn card(snapshot: &WeatherSnapshot, theme: Theme, observed_local: Option<&str>) -> String {
    let mut lines = vec![format!("[{theme} theme]")];

    match &snapshot.report {
        Some(report) => {
            lines.push(report.location_name.clone());
            lines.push(format!("{} ({})", report.description, report.comfortability));
            lines.push(format!("{} °C", report.rounded_temperature()));
            lines.push(format!("Wind  {} m/s", report.wind_speed));
            lines.push(format!("Rain  {}%", report.rain_possibility));
            lines.push(format!("Last observed: {}", observed_local.unwrap_or("--:--")));
        }
        None => lines.push("No weather data yet.".to_string()),
    }

    match (snapshot.status(), &snapshot.last_error) {
        (SnapshotStatus::Loading, _) => lines.push("Loading...".to_string()),
        (SnapshotStatus::FailedStale, Some(err)) => {
            lines.push(format!("Refresh failed, showing earlier data: {err}"));
        }
        (SnapshotStatus::FailedEmpty, Some(err)) => lines.push(format!("Fetch failed: {err}")),
        _ => {}
    }

    lines.join("\n")
}

pub fn card_json(
    city: &CityIdentifiers,
    snapshot: &WeatherSnapshot,
    theme: Theme,
    observed_local: Option<&str>,
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&CardJson {
        city,
        theme,
        report: snapshot.report.as_ref(),
        observed_local,
        error: snapshot.last_error.as_ref().map(ToString::to_string),
    })
}

pub fn moment_json(city: &CityIdentifiers, moment: Moment) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&MomentJson {
        city,
        moment,
        theme: Theme::from(moment),
    })
}
