use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::{
    model::{DayCount, RequestParameters, UnitSystem},
    request::DEFAULT_ENDPOINT,
};

/// Point the forecast is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for Location {
    fn default() -> Self {
        Self { latitude: 26.231, longitude: -98.445 }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// days = 7
/// units = "imperial"
/// output = "forecast.csv"
///
/// [location]
/// latitude = 26.231
/// longitude = -98.445
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Forecast window in days, 1 to 10.
    pub days: u8,
    pub units: UnitSystem,
    /// Where scraped rows are written.
    pub output: PathBuf,
    pub endpoint: String,
    pub location: Location,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            days: 7,
            units: UnitSystem::default(),
            output: PathBuf::from("forecast.csv"),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            location: Location::default(),
        }
    }
}

impl Config {
    /// Validated request parameters for the configured forecast.
    pub fn request_parameters(&self) -> Result<RequestParameters> {
        let day_count = DayCount::new(self.days).context(
            "Invalid `days` setting.\n\
             Hint: run `forecast configure` or pass `--days` with a value from 1 to 10.",
        )?;

        Ok(RequestParameters::new(
            day_count,
            self.location.latitude,
            self.location.longitude,
            self.units,
        ))
    }

    /// Load config from disk, or return the defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml = self.to_toml()?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(path)
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "forecast-scraper", "forecast-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
