//! Static sunrise/sunset schedule keyed by reference city and calendar date.
//!
//! The built-in table ships as `data/sunrise-sunset.json` and is parsed once on
//! first use. Other tables of the same shape can be loaded with
//! [`SunriseTable::from_json`].

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::error::WidgetError;

const BUILTIN_JSON: &str = include_str!("../data/sunrise-sunset.json");

static BUILTIN: LazyLock<Result<SunriseTable, String>> =
    LazyLock::new(|| SunriseTable::from_json(BUILTIN_JSON).map_err(|e| e.to_string()));

/// Sunrise and sunset for one city on one day, in the city's local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SunriseRecord {
    pub sunrise: NaiveTime,
    pub sunset: NaiveTime,
}

#[derive(Debug, Clone)]
struct CitySchedule {
    timezone: Tz,
    days: BTreeMap<NaiveDate, SunriseRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct SunriseTable {
    cities: HashMap<String, CitySchedule>,
}

#[derive(Debug, Deserialize)]
struct RawTable {
    cities: Vec<RawCity>,
}

#[derive(Debug, Deserialize)]
struct RawCity {
    city: String,
    timezone: String,
    days: Vec<(String, String, String)>,
}

impl SunriseTable {
    /// The table embedded in the crate.
    pub fn builtin() -> Result<&'static SunriseTable, WidgetError> {
        BUILTIN
            .as_ref()
            .map_err(|msg| WidgetError::InvalidSunriseTable(msg.clone()))
    }

    /// Parse a table from JSON shaped as
    /// `{"cities":[{"city":..,"timezone":..,"days":[["YYYY-MM-DD","HH:MM","HH:MM"],..]}]}`.
    pub fn from_json(json: &str) -> Result<Self, WidgetError> {
        let raw: RawTable = serde_json::from_str(json)
            .map_err(|e| WidgetError::InvalidSunriseTable(e.to_string()))?;

        let mut cities = HashMap::with_capacity(raw.cities.len());
        for city in raw.cities {
            let timezone: Tz = city.timezone.parse().map_err(|e| {
                WidgetError::InvalidSunriseTable(format!(
                    "bad timezone '{}' for {}: {e}",
                    city.timezone, city.city
                ))
            })?;

            let mut days = BTreeMap::new();
            for (date, sunrise, sunset) in &city.days {
                let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|e| {
                    WidgetError::InvalidSunriseTable(format!("bad date '{date}' for {}: {e}", city.city))
                })?;
                let record = SunriseRecord {
                    sunrise: parse_clock(&city.city, sunrise)?,
                    sunset: parse_clock(&city.city, sunset)?,
                };
                if record.sunrise >= record.sunset {
                    return Err(WidgetError::InvalidSunriseTable(format!(
                        "sunrise {} is not before sunset {} for {} on {date}",
                        record.sunrise, record.sunset, city.city
                    )));
                }
                days.insert(date, record);
            }

            cities.insert(city.city, CitySchedule { timezone, days });
        }

        Ok(Self { cities })
    }

    pub fn lookup(&self, city: &str, date: NaiveDate) -> Result<SunriseRecord, WidgetError> {
        self.cities
            .get(city)
            .and_then(|schedule| schedule.days.get(&date))
            .copied()
            .ok_or_else(|| WidgetError::NoSunriseData {
                city: city.to_string(),
                date,
            })
    }

    /// Timezone the city's dates and clock times are expressed in.
    pub fn timezone(&self, city: &str) -> Option<Tz> {
        self.cities.get(city).map(|s| s.timezone)
    }

    /// Wall-clock time in the city's timezone.
    pub fn local_time(&self, city: &str, instant: DateTime<Utc>) -> Option<NaiveDateTime> {
        self.timezone(city)
            .map(|tz| instant.with_timezone(&tz).naive_local())
    }

    /// First and last covered date for a city.
    pub fn date_range(&self, city: &str) -> Option<(NaiveDate, NaiveDate)> {
        let days = &self.cities.get(city)?.days;
        let first = days.keys().next()?;
        let last = days.keys().next_back()?;
        Some((*first, *last))
    }
}

fn parse_clock(city: &str, value: &str) -> Result<NaiveTime, WidgetError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|e| WidgetError::InvalidSunriseTable(format!("bad time '{value}' for {city}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn builtin_table_parses() {
        let table = SunriseTable::builtin().expect("embedded table must parse");
        let rec = table.lookup("臺北", date(2026, 6, 21)).unwrap();
        assert!(rec.sunrise < NaiveTime::from_hms_opt(5, 30, 0).unwrap());
        assert!(rec.sunset > NaiveTime::from_hms_opt(18, 30, 0).unwrap());
        assert_eq!(table.timezone("臺北"), Some(chrono_tz::Asia::Taipei));
    }

    #[test]
    fn every_supported_city_has_a_full_schedule() {
        let table = SunriseTable::builtin().unwrap();
        for ids in location::all() {
            let (first, last) = table
                .date_range(ids.sunrise_city_name)
                .unwrap_or_else(|| panic!("no schedule for {}", ids.sunrise_city_name));
            for day in first.iter_days().take_while(|d| *d <= last) {
                assert!(
                    table.lookup(ids.sunrise_city_name, day).is_ok(),
                    "gap for {} on {day}",
                    ids.city_name
                );
            }
        }
    }

    #[test]
    fn lookup_outside_range_is_no_sunrise_data() {
        let table = SunriseTable::builtin().unwrap();
        let err = table.lookup("臺北", date(2019, 1, 1)).unwrap_err();
        assert!(matches!(err, WidgetError::NoSunriseData { ref city, .. } if city == "臺北"));
    }

    #[test]
    fn lookup_unknown_city_is_no_sunrise_data() {
        let table = SunriseTable::builtin().unwrap();
        let err = table.lookup("Atlantis", date(2026, 1, 1)).unwrap_err();
        assert!(matches!(err, WidgetError::NoSunriseData { .. }));
    }

    #[test]
    fn local_time_uses_city_timezone() {
        use chrono::TimeZone;
        let table = SunriseTable::builtin().unwrap();
        let instant = Utc.with_ymd_and_hms(2026, 5, 1, 20, 30, 0).unwrap();
        let local = table.local_time("高雄", instant).unwrap();
        assert_eq!(local.date(), date(2026, 5, 2));
        assert_eq!(local.time(), NaiveTime::from_hms_opt(4, 30, 0).unwrap());
        assert!(table.local_time("Atlantis", instant).is_none());
    }

    #[test]
    fn rejects_sunset_before_sunrise() {
        let json = r#"{"cities":[{"city":"X","timezone":"UTC","days":[["2026-01-01","18:00","06:00"]]}]}"#;
        let err = SunriseTable::from_json(json).unwrap_err();
        assert!(matches!(err, WidgetError::InvalidSunriseTable(_)));
    }

    #[test]
    fn rejects_unknown_timezone() {
        let json = r#"{"cities":[{"city":"X","timezone":"Mars/Olympus","days":[]}]}"#;
        let err = SunriseTable::from_json(json).unwrap_err();
        assert!(err.to_string().contains("bad timezone"));
    }

    #[test]
    fn rejects_malformed_clock() {
        let json = r#"{"cities":[{"city":"X","timezone":"UTC","days":[["2026-01-01","6am","18:00"]]}]}"#;
        assert!(SunriseTable::from_json(json).is_err());
    }
}
