use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::model::{Dst, ForecastStart};

pub const DEFAULT_BASE_URL: &str = "http://www.pvforecast.cz/api/";

/// HTTP client settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Forecast endpoint; hourly and daily forecasts share it.
    pub base_url: String,

    /// Per-request timeout in seconds; must be at least 1.
    pub timeout_secs: u64,

    /// Used by the `get_*_irradiance` shortcuts.
    pub dst: Dst,
    pub start: ForecastStart,
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            dst: Dst::default(),
            start: ForecastStart::default(),
        }
    }
}

/// Default coordinates used when a command does not pass any.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub api_key: Option<String>,

    /// Example TOML:
    /// [location]
    /// latitude = 50.0
    /// longitude = 14.0
    pub location: Option<Location>,

    #[serde(default)]
    pub client: ClientConfig,
}

impl Config {
    /// Return the configured API key or a hint on how to set one.
    pub fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty()).ok_or_else(|| {
            anyhow!(
                "No API key configured.\n\
                 Hint: run `pvforecast configure` and enter your PVForecast API key."
            )
        })
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn set_location(&mut self, latitude: f64, longitude: f64) {
        self.location = Some(Location { latitude, longitude });
    }

    /// Load config from the platform config directory, or defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform config directory, creating it as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
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

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("cz", "pvforecast", "pvforecast-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_errors_when_not_set() {
        let cfg = Config::default();
        let err = cfg.api_key().unwrap_err();

        assert!(err.to_string().contains("No API key configured"));
        assert!(err.to_string().contains("pvforecast configure"));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let mut cfg = Config::default();
        cfg.set_api_key("  ".into());
        assert!(cfg.api_key().is_err());

        cfg.set_api_key("KEY".into());
        assert_eq!(cfg.api_key().unwrap(), "KEY");
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.client.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.client.timeout_secs, 30);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.set_location(50.0, 14.0);
        cfg.client.dst = Dst::Disabled;
        cfg.client.start = ForecastStart::Tomorrow;

        cfg.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();

        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_client_section_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            api_key = "KEY"

            [client]
            timeout_secs = 5
            start = "today"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.client.timeout(), Duration::from_secs(5));
        assert_eq!(cfg.client.start, ForecastStart::Today);
        assert_eq!(cfg.client.dst, Dst::Auto);
        assert_eq!(cfg.client.base_url, DEFAULT_BASE_URL);
        assert!(cfg.location.is_none());
    }

    #[test]
    fn invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_key = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
