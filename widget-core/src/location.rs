//! Display city -> endpoint identifiers.

use serde::Serialize;

use crate::error::WidgetError;

/// City shown when the preference store has nothing saved yet.
pub const DEFAULT_CITY: &str = "臺北市";

/// The three identifiers a display city fans out into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CityIdentifiers {
    /// Display name, also what the forecast endpoint expects.
    pub city_name: &'static str,
    /// Observation station the current-conditions endpoint expects.
    pub location_name: &'static str,
    /// Reference city in the sunrise/sunset table.
    pub sunrise_city_name: &'static str,
}

const fn city(
    city_name: &'static str,
    location_name: &'static str,
    sunrise_city_name: &'static str,
) -> CityIdentifiers {
    CityIdentifiers {
        city_name,
        location_name,
        sunrise_city_name,
    }
}

static CITIES: &[CityIdentifiers] = &[
    city("宜蘭縣", "宜蘭", "宜蘭"),
    city("嘉義市", "嘉義", "嘉義"),
    city("屏東縣", "恆春", "屏東"),
    city("雲林縣", "古坑", "雲林"),
    city("臺東縣", "臺東", "臺東"),
    city("臺北市", "臺北", "臺北"),
    city("金門縣", "金門", "金門"),
    city("桃園市", "新屋", "桃園"),
    city("彰化縣", "彰師大", "彰化"),
    city("嘉義縣", "阿里山", "嘉義"),
    city("高雄市", "高雄", "高雄"),
    city("基隆市", "基隆", "基隆"),
    city("臺南市", "臺南", "臺南"),
    city("南投縣", "日月潭", "南投"),
    city("臺中市", "臺中", "臺中"),
    city("新竹縣", "新竹", "新竹"),
    city("新竹市", "新竹", "新竹"),
    city("花蓮縣", "花蓮", "花蓮"),
    city("連江縣", "馬祖", "馬祖"),
    city("澎湖縣", "澎湖", "澎湖"),
    city("新北市", "板橋", "新北"),
    city("苗栗縣", "後龍", "苗栗"),
];

/// Resolve a display city. Unsupported names are an error, never a fallback.
pub fn resolve(display_city: &str) -> Result<&'static CityIdentifiers, WidgetError> {
    let wanted = display_city.trim();
    CITIES
        .iter()
        .find(|c| c.city_name == wanted)
        .ok_or_else(|| WidgetError::UnknownCity(display_city.to_string()))
}

/// Every supported display city, in table order.
pub fn supported_cities() -> impl Iterator<Item = &'static str> {
    CITIES.iter().map(|c| c.city_name)
}

/// The whole resolution table.
pub fn all() -> &'static [CityIdentifiers] {
    CITIES
}
