use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    endpoint::{DEFAULT_API_BASE, Endpoint},
    error::WidgetError,
    location::{self, CityIdentifiers, DEFAULT_CITY},
};

/// Preference key under which the selected display city is stored.
pub const CITY_KEY: &str = "cityName";

/// Environment variable that overrides the stored API credential.
pub const AUTHORIZATION_ENV: &str = "CWA_AUTHORIZATION";

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Key-value store for user preferences that outlive a session.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// authorization = "CWA-..."
/// timeout_secs = 10
///
/// [preferences]
/// cityName = "臺北市"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Open-data API key.
    pub authorization: Option<String>,

    /// Override for the datastore root, mostly useful against a local mock.
    pub api_base: Option<String>,

    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub preferences: BTreeMap<String, String>,
}

impl PreferenceStore for Config {
    fn get(&self, key: &str) -> Option<String> {
        self.preferences.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.preferences.insert(key.to_string(), value.to_string());
    }
}

/// Non-persistent store, for tests and throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: HashMap<String, String>,
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

/// City the user picked last time, or [`DEFAULT_CITY`] if nothing is stored.
///
/// A stored name that is no longer supported is reported, not replaced.
pub fn preferred_city(store: &impl PreferenceStore) -> Result<&'static CityIdentifiers, WidgetError> {
    match store.get(CITY_KEY) {
        Some(name) => location::resolve(&name),
        None => location::resolve(DEFAULT_CITY),
    }
}

/// Validate and remember a display city.
pub fn remember_city(
    store: &mut impl PreferenceStore,
    display_city: &str,
) -> Result<&'static CityIdentifiers, WidgetError> {
    let ids = location::resolve(display_city)?;
    store.set(CITY_KEY, ids.city_name);
    Ok(ids)
}

impl Config {
    /// Credential from the environment, falling back to the config file.
    pub fn authorization(&self) -> Result<String> {
        std::env::var(AUTHORIZATION_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.authorization.clone())
            .ok_or_else(|| {
                anyhow!(
                    "No API authorization configured.\n\
                     Hint: run `weather-widget configure` or set {AUTHORIZATION_ENV}."
                )
            })
    }

    pub fn set_authorization(&mut self, key: String) {
        self.authorization = Some(key);
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn endpoint(&self) -> Result<Endpoint> {
        let base = self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE);
        Endpoint::new(base, self.authorization()?)
            .with_context(|| format!("Invalid api_base '{base}' in config"))
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-widget", "weather-widget")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_preference_uses_default_city() {
        let store = MemoryPreferences::default();
        assert_eq!(preferred_city(&store).unwrap().city_name, DEFAULT_CITY);
    }

    #[test]
    fn stored_preference_is_resolved() {
        let mut store = MemoryPreferences::default();
        store.set(CITY_KEY, "高雄市");
        assert_eq!(preferred_city(&store).unwrap().location_name, "高雄");
    }

    #[test]
    fn stale_preference_is_an_error_not_a_default() {
        let mut store = MemoryPreferences::default();
        store.set(CITY_KEY, "舊城市");
        assert!(matches!(preferred_city(&store), Err(WidgetError::UnknownCity(_))));
    }

    #[test]
    fn remember_city_rejects_unknown_and_leaves_store_alone() {
        let mut cfg = Config::default();
        assert!(remember_city(&mut cfg, "Springfield").is_err());
        assert!(cfg.get(CITY_KEY).is_none());

        remember_city(&mut cfg, "花蓮縣").unwrap();
        assert_eq!(cfg.get(CITY_KEY).as_deref(), Some("花蓮縣"));
    }

    #[test]
    fn timeout_defaults_to_ten_seconds() {
        let mut cfg = Config::default();
        assert_eq!(cfg.timeout(), Duration::from_secs(10));
        cfg.timeout_secs = Some(3);
        assert_eq!(cfg.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn endpoint_uses_override_base() {
        let mut cfg = Config::default();
        cfg.set_authorization("KEY".into());
        cfg.api_base = Some("http://localhost:9999/mock".into());
        let url = cfg.endpoint().unwrap().dataset_url("O-A0003-001", "臺北");
        assert_eq!(url.host_str(), Some("localhost"));
        assert_eq!(url.path(), "/mock/O-A0003-001");
    }

    #[test]
    fn bad_api_base_is_a_config_error() {
        let mut cfg = Config::default();
        cfg.set_authorization("KEY".into());
        cfg.api_base = Some("mailto:ops@example.com".into());
        let err = cfg.endpoint().unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.contains("Invalid api_base 'mailto:ops@example.com' in config"));
        assert!(chain.contains("must be an http(s) URL"));
    }

    #[test]
    fn round_trips_through_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_authorization("CWA-KEY".into());
        remember_city(&mut cfg, "臺中市").unwrap();
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.authorization.as_deref(), Some("CWA-KEY"));
        assert_eq!(preferred_city(&loaded).unwrap().city_name, "臺中市");
    }

    #[test]
    fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert!(cfg.authorization.is_none());
        assert!(cfg.preferences.is_empty());
    }

    #[test]
    fn unparsable_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "authorization = [").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
