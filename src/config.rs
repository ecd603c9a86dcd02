use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::spatial::overpass::{DEFAULT_OVERPASS_URL, DEFAULT_SEARCH_RADIUS_M};

pub const DEFAULT_MODEL_PATH: &str = "pollution_source_model.json";

/// Runtime settings for classification. Every field has a default, so a
/// config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub model_path: PathBuf,
    pub overpass_url: String,
    pub search_radius_m: f64,
    pub http_timeout_secs: u64,
    /// Substitute sentinel distances when the geodata fetch fails instead
    /// of failing the request.
    pub geodata_fallback: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            overpass_url: DEFAULT_OVERPASS_URL.to_string(),
            search_radius_m: DEFAULT_SEARCH_RADIUS_M,
            http_timeout_secs: 30,
            geodata_fallback: false,
        }
    }
}

impl Settings {
    /// Read settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.search_radius_m.is_finite() && self.search_radius_m > 0.0) {
            bail!("search_radius_m must be positive, got {}", self.search_radius_m);
        }
        if self.http_timeout_secs == 0 {
            bail!("http_timeout_secs must be at least 1");
        }
        if self.overpass_url.trim().is_empty() {
            bail!("overpass_url is empty");
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "search_radius_m": 500, "geodata_fallback": true }"#).unwrap();

        let s = Settings::load(&path).unwrap();
        assert_eq!(s.search_radius_m, 500.0);
        assert!(s.geodata_fallback);
        assert_eq!(s.overpass_url, DEFAULT_OVERPASS_URL);
        assert_eq!(s.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
    }

    #[test]
    fn unknown_keys_and_bad_values_fail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        std::fs::write(&path, r#"{ "radius": 500 }"#).unwrap();
        assert!(Settings::load(&path).is_err());

        std::fs::write(&path, r#"{ "search_radius_m": -1 }"#).unwrap();
        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn defaults_are_valid() {
        Settings::default().validate().unwrap();
        assert_eq!(Settings::default().http_timeout(), Duration::from_secs(30));
    }
}
