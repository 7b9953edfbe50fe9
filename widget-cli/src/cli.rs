use std::sync::Arc;

use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password, Select};
use tracing::{debug, warn};
use weather_widget_core::{
    CityIdentifiers, Config, CycleOutcome, ReqwestClient, SnapshotStatus, SunriseTable, Theme,
    WeatherAggregator, moment, preferred_city, remember_city, resolve, supported_cities,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-widget", version, about = "Weather dashboard widget")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API credential and pick a preferred city.
    Configure,

    /// Show current weather for the preferred city.
    Show {
        /// Display city to use instead of the saved one.
        #[arg(long)]
        city: Option<String>,

        /// Keep the card open and offer a refresh after each fetch.
        #[arg(long, conflicts_with = "json")]
        watch: bool,

        /// Print the snapshot as JSON instead of a card.
        #[arg(long)]
        json: bool,
    },

    /// Print whether it is day or night, and the matching theme.
    Moment {
        #[arg(long)]
        city: Option<String>,

        /// RFC 3339 instant; defaults to now.
        #[arg(long)]
        at: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// List supported display cities.
    Cities,

    /// Remember a display city for later sessions.
    SetCity { city: String },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, watch, json } => show(city, watch, json).await,
            Command::Moment { city, at, json } => {
                let config = Config::load()?;
                let ids = pick_city(&config, city.as_deref())?;
                let now = match at {
                    Some(raw) => DateTime::parse_from_rfc3339(&raw)
                        .with_context(|| format!("Invalid --at instant '{raw}'"))?
                        .with_timezone(&Utc),
                    None => Utc::now(),
                };
                let m = moment(SunriseTable::builtin()?, ids.sunrise_city_name, now)?;
                if json {
                    println!("{}", render::moment_json(ids, m)?);
                } else {
                    println!("{}: {m} ({} theme)", ids.city_name, Theme::from(m));
                }
                Ok(())
            }
            Command::Cities => {
                for name in supported_cities() {
                    println!("{name}");
                }
                Ok(())
            }
            Command::SetCity { city } => {
                let mut config = Config::load()?;
                let ids = remember_city(&mut config, &city)?;
                config.save()?;
                println!("Preferred city set to {}", ids.city_name);
                Ok(())
            }
        }
    }
}

fn pick_city(config: &Config, city: Option<&str>) -> anyhow::Result<&'static CityIdentifiers> {
    let ids = match city {
        Some(name) => resolve(name)?,
        None => preferred_city(config)?,
    };
    Ok(ids)
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let key = Password::new("CWA open-data authorization key:")
        .without_confirmation()
        .with_help_message("Leave empty to keep the current key")
        .prompt()?;
    if !key.trim().is_empty() {
        config.set_authorization(key.trim().to_string());
    }

    let cities: Vec<&str> = supported_cities().collect();
    let current = preferred_city(&config).ok().map(|ids| ids.city_name);
    let cursor = current
        .and_then(|name| cities.iter().position(|c| *c == name))
        .unwrap_or(0);
    let chosen = Select::new("City:", cities).with_starting_cursor(cursor).prompt()?;
    remember_city(&mut config, chosen)?;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

/// Theme for the city right now. Missing sunrise data falls back to light.
fn current_theme(ids: &CityIdentifiers) -> Theme {
    let computed = SunriseTable::builtin()
        .and_then(|table| moment(table, ids.sunrise_city_name, Utc::now()));
    match computed {
        Ok(m) => Theme::from(m),
        Err(err) => {
            warn!(city = ids.city_name, error = %err, "no day/night context, using light theme");
            Theme::Light
        }
    }
}

async fn show(city: Option<String>, watch: bool, json: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let ids = pick_city(&config, city.as_deref())?;

    let http = Arc::new(ReqwestClient::new(config.timeout())?);
    let aggregator = WeatherAggregator::cwa(*ids, config.endpoint()?, http);
    let table = SunriseTable::builtin()?;

    loop {
        match aggregator.refresh().await {
            Ok(CycleOutcome::Published(_)) => {}
            Ok(CycleOutcome::Superseded) => debug!(city = ids.city_name, "refresh superseded"),
            // Also recorded on the snapshot, which is rendered below.
            Err(err) => debug!(city = ids.city_name, error = %err, "refresh failed"),
        }

        let snapshot = aggregator.snapshot();
        let observed = snapshot.report.as_ref().and_then(|r| {
            table
                .local_time(ids.sunrise_city_name, r.observation_time)
                .map(|t| t.format("%H:%M").to_string())
        });
        let theme = current_theme(ids);
        if json {
            println!("{}", render::card_json(ids, &snapshot, theme, observed.as_deref())?);
        } else {
            println!("{}", render::card(&snapshot, theme, observed.as_deref()));
        }

        if !watch || !Confirm::new("Refresh?").with_default(true).prompt()? {
            if let (SnapshotStatus::FailedEmpty, Some(err)) = (snapshot.status(), snapshot.last_error) {
                return Err(anyhow!(err).context(format!("No weather data for {}", ids.city_name)));
            }
            return Ok(());
        }
    }
}
