//! Runtime settings.
//!
//! Layers, lowest to highest: built-in defaults, `geolearn.toml`,
//! `GEOLEARN_*` env vars (`__` nests, e.g. `GEOLEARN_GEMINI__MODEL`),
//! and `GEMINI_API_KEY`.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "geolearn.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// CKAN `package_show` endpoint.
    pub catalog_url: String,
    pub facilities_dataset: String,
    pub tram_dataset: String,
    pub bus_dataset: String,
    pub http_timeout_secs: u64,
    pub capability_timeout_secs: u64,
    /// Overrides ~/.geolearn/favorites.json.
    pub favorites_path: Option<PathBuf>,
    pub gemini: GeminiSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog_url: "https://datos.tenerife.es/ckan/api/action/package_show".into(),
            facilities_dataset: "573a49e8-e2fb-4fe4-b47b-ac5dec1bf580".into(),
            tram_dataset: "749d9208-ad97-47f9-a497-0385df40420d".into(),
            bus_dataset: "19914413-77e1-441c-83a7-8f0f45c0767a".into(),
            http_timeout_secs: 15,
            capability_timeout_secs: 20,
            favorites_path: None,
            gemini: GeminiSettings::default(),
        }
    }
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash-lite".into(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".into(),
        }
    }
}

impl Settings {
    /// Load from `geolearn.toml` in the working directory plus the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Load with a specific TOML file. A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let settings: Settings = Self::figment(path)
            .extract()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("GEOLEARN_").split("__"))
            .merge(Env::raw().only(&["GEMINI_API_KEY"]).map(|_| "gemini.api_key".into()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog_url.trim().is_empty() {
            return Err(ConfigError::Invalid("catalog_url is empty".into()));
        }
        for (key, id) in [
            ("facilities_dataset", &self.facilities_dataset),
            ("tram_dataset", &self.tram_dataset),
            ("bus_dataset", &self.bus_dataset),
        ] {
            if id.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} is empty", key)));
            }
        }
        if self.http_timeout_secs == 0 || self.capability_timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be at least one second".into()));
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn capability_timeout(&self) -> Duration {
        Duration::from_secs(self.capability_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::figment(&dir.path().join("absent.toml"))
            .extract::<Settings>()
            .unwrap();
        assert_eq!(settings.facilities_dataset, "573a49e8-e2fb-4fe4-b47b-ac5dec1bf580");
        assert_eq!(settings.gemini.model, "gemini-2.5-flash-lite");
        assert_eq!(settings.http_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("geolearn.toml");
        fs::write(
            &path,
            r#"
                catalog_url = "https://catalog.test/package_show"
                capability_timeout_secs = 5
                favorites_path = "/tmp/favs.json"

                [gemini]
                model = "gemini-test"
            "#,
        )
        .unwrap();

        let settings = Settings::figment(&path).extract::<Settings>().unwrap();
        assert_eq!(settings.catalog_url, "https://catalog.test/package_show");
        assert_eq!(settings.capability_timeout(), Duration::from_secs(5));
        assert_eq!(settings.favorites_path, Some(PathBuf::from("/tmp/favs.json")));
        assert_eq!(settings.gemini.model, "gemini-test");
        assert_eq!(settings.gemini.endpoint, GeminiSettings::default().endpoint);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let settings = Settings { http_timeout_secs: 0, ..Settings::default() };
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));
    }
}
