//! Day/night context for a city at a given instant.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{error::WidgetError, location, sunrise::SunriseTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Moment {
    Day,
    Night,
}

/// Display theme a moment maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl From<Moment> for Theme {
    fn from(moment: Moment) -> Self {
        match moment {
            Moment::Day => Theme::Light,
            Moment::Night => Theme::Dark,
        }
    }
}

impl fmt::Display for Moment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Moment::Day => "day",
            Moment::Night => "night",
        })
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        })
    }
}

/// Whether `now` is day or night for `reference_city`.
///
/// The calendar date and clock time are taken in the city's own timezone.
/// Daytime is the half-open interval `[sunrise, sunset)`.
pub fn moment(
    table: &SunriseTable,
    reference_city: &str,
    now: DateTime<Utc>,
) -> Result<Moment, WidgetError> {
    let local = table
        .local_time(reference_city, now)
        .ok_or_else(|| WidgetError::NoSunriseData {
            city: reference_city.to_string(),
            date: now.date_naive(),
        })?;

    let record = table.lookup(reference_city, local.date())?;
    let clock = local.time();

    if clock >= record.sunrise && clock < record.sunset {
        Ok(Moment::Day)
    } else {
        Ok(Moment::Night)
    }
}

/// Resolve a display city and compute its moment against the built-in table.
pub fn moment_for(display_city: &str, now: DateTime<Utc>) -> Result<Moment, WidgetError> {
    let ids = location::resolve(display_city)?;
    moment(SunriseTable::builtin()?, ids.sunrise_city_name, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const TABLE: &str = r#"{"cities":[
        {"city":"Flat","timezone":"UTC","days":[["2026-03-01","06:00","18:00"]]},
        {"city":"East","timezone":"Asia/Taipei","days":[
            ["2026-03-01","06:00","18:00"],
            ["2026-03-02","06:01","17:59"]
        ]}
    ]}"#;

    fn table() -> SunriseTable {
        SunriseTable::from_json(TABLE).unwrap()
    }

    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, h, m, 0).unwrap()
    }

    #[test]
    fn half_open_interval_boundaries() {
        let t = table();
        assert_eq!(moment(&t, "Flat", utc(5, 59)).unwrap(), Moment::Night);
        assert_eq!(moment(&t, "Flat", utc(6, 0)).unwrap(), Moment::Day);
        assert_eq!(moment(&t, "Flat", utc(17, 59)).unwrap(), Moment::Day);
        assert_eq!(moment(&t, "Flat", utc(18, 0)).unwrap(), Moment::Night);
    }

    #[test]
    fn same_inputs_same_output() {
        let t = table();
        let now = utc(12, 0);
        assert_eq!(moment(&t, "Flat", now).unwrap(), moment(&t, "Flat", now).unwrap());
    }

    #[test]
    fn date_is_taken_in_city_timezone() {
        let t = table();
        // 2026-03-01 16:30 UTC is 2026-03-02 00:30 in Taipei.
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 16, 30, 0).unwrap();
        assert_eq!(moment(&t, "East", now).unwrap(), Moment::Night);

        // 2026-03-01 22:01 UTC is 06:01 local on 2026-03-02, exactly sunrise.
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 22, 1, 0).unwrap();
        assert_eq!(moment(&t, "East", now).unwrap(), Moment::Day);

        // Local 18:00 on 03-01 is 10:00 UTC.
        assert_eq!(moment(&t, "East", utc(10, 0)).unwrap(), Moment::Night);
        assert_eq!(moment(&t, "East", utc(9, 59)).unwrap(), Moment::Day);
    }

    #[test]
    fn missing_date_is_no_sunrise_data() {
        let t = table();
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();
        let err = moment(&t, "Flat", now).unwrap_err();
        assert!(matches!(
            err,
            WidgetError::NoSunriseData { ref city, date }
                if city == "Flat" && date == chrono::NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
        ));
    }

    #[test]
    fn unknown_reference_city_is_no_sunrise_data() {
        let err = moment(&table(), "Nowhere", utc(12, 0)).unwrap_err();
        assert!(matches!(err, WidgetError::NoSunriseData { .. }));
    }

    #[test]
    fn moment_for_resolves_display_city() {
        // Noon in Taipei on a covered date.
        let noon = Utc.with_ymd_and_hms(2026, 10, 19, 4, 0, 0).unwrap();
        assert_eq!(moment_for("臺北市", noon).unwrap(), Moment::Day);

        let midnight = Utc.with_ymd_and_hms(2026, 10, 19, 16, 0, 0).unwrap();
        assert_eq!(moment_for("新北市", midnight).unwrap(), Moment::Night);
    }

    #[test]
    fn moment_for_unknown_city() {
        let err = moment_for("Gotham", utc(12, 0)).unwrap_err();
        assert!(matches!(err, WidgetError::UnknownCity(_)));
    }

    #[test]
    fn theme_follows_moment() {
        assert_eq!(Theme::from(Moment::Day), Theme::Light);
        assert_eq!(Theme::from(Moment::Night), Theme::Dark);
        assert_eq!(Theme::Dark.to_string(), "dark");
    }
}
