//! Optional JSON configuration at ~/.errand/config.json.
//!
//! Every field has a default, so a partial file (or none at all) is fine.
//! Example:
//!
//! ```json
//! {
//!   "tariff": { "base_fare": 5.0, "per_km": 0.5 },
//!   "tracking": { "interval_ms": 3000, "step": 0.05 },
//!   "server": { "port": 8080 },
//!   "places": [
//!     { "name": "Office", "coordinate": { "latitude": -17.82, "longitude": 31.05 } }
//!   ]
//! }
//! ```

use crate::places::Place;
use crate::pricing::Tariff;
use crate::tracking::TrackingConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid JSON in config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 3000 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tariff: Tariff,
    pub tracking: TrackingConfig,
    pub server: ServerConfig,
    /// Extra named places, matched before the built-in ones.
    pub places: Vec<Place>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".errand")
            .join("config.json")
    }

    /// Load from `path` if given (it must exist), otherwise from the default
    /// path, falling back to defaults when that file is absent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load_from(p),
            None => {
                let p = Self::default_path();
                if p.exists() {
                    Self::load_from(&p)
                } else {
                    tracing::debug!(path = %p.display(), "no config file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), places = config.places.len(), "config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.tariff;
        if !(t.base_fare.is_finite() && t.base_fare >= 0.0 && t.per_km.is_finite() && t.per_km >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "tariff must be non-negative (base_fare={}, per_km={})",
                t.base_fare, t.per_km
            )));
        }

        let tr = &self.tracking;
        if tr.interval_ms == 0 {
            return Err(ConfigError::Invalid("tracking.interval_ms must be > 0".into()));
        }
        if !(tr.step > 0.0 && tr.step <= 1.0) {
            return Err(ConfigError::Invalid(format!("tracking.step must be in (0, 1], got {}", tr.step)));
        }
        if !(0.0..=1.0).contains(&tr.initial_progress) {
            return Err(ConfigError::Invalid(format!(
                "tracking.initial_progress must be in [0, 1], got {}",
                tr.initial_progress
            )));
        }
        if !(tr.jitter_deg.is_finite() && tr.jitter_deg >= 0.0) {
            return Err(ConfigError::Invalid(format!("tracking.jitter_deg must be >= 0, got {}", tr.jitter_deg)));
        }
        crate::geo::Coordinate::new(tr.reference.latitude, tr.reference.longitude)
            .map_err(|e| ConfigError::Invalid(format!("tracking.reference: {}", e)))?;

        for place in &self.places {
            crate::geo::Coordinate::new(place.coordinate.latitude, place.coordinate.longitude)
                .map_err(|e| ConfigError::Invalid(format!("place '{}': {}", place.name, e)))?;
        }
        Ok(())
    }
}
