use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result, anyhow};

use crate::geo::{parse_coordinate, Coordinate};
use crate::locale::Locale;
use crate::provider::LocationProvider;

pub const DEFAULT_TEXT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_SPEECH_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_VOICE: &str = "Kore";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_IP_LOOKUP_URL: &str = "http://ip-api.com/json";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub text_model: Option<String>,
    pub speech_model: Option<String>,
    pub voice_name: Option<String>,
    pub api_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub locale: Option<Locale>,

    pub location_provider: Option<String>,
    /// `"lat, lng"` for the fixed provider
    pub fixed_location: Option<String>,
    pub replay_file: Option<PathBuf>,
    pub ip_lookup_url: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub high_accuracy: Option<bool>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            location_provider: Some(LocationProvider::Ip.as_str().to_string()),
            ..Default::default()
        }
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("locus").join("config.json"))
    }

    /// Environment first (`GEMINI_API_KEY`, then `API_KEY`), then the file.
    /// A missing key is not an error here; requests will simply fail.
    pub fn api_key(&self) -> String {
        std::env::var("GEMINI_API_KEY")
            .ok()
            .or_else(|| std::env::var("API_KEY").ok())
            .or_else(|| self.gemini_api_key.clone())
            .unwrap_or_default()
    }

    pub fn text_model(&self) -> &str {
        self.text_model.as_deref().unwrap_or(DEFAULT_TEXT_MODEL)
    }

    pub fn speech_model(&self) -> &str {
        self.speech_model.as_deref().unwrap_or(DEFAULT_SPEECH_MODEL)
    }

    pub fn voice_name(&self) -> &str {
        self.voice_name.as_deref().unwrap_or(DEFAULT_VOICE)
    }

    pub fn api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(30))
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries.unwrap_or(1).min(1)
    }

    pub fn locale(&self) -> Locale {
        self.locale.unwrap_or_default()
    }

    pub fn location_provider(&self) -> LocationProvider {
        self.location_provider
            .as_deref()
            .and_then(LocationProvider::from_str)
            .unwrap_or(LocationProvider::Ip)
    }

    pub fn fixed_location(&self) -> Result<Option<Coordinate>> {
        self.fixed_location
            .as_deref()
            .map(parse_coordinate)
            .transpose()
            .map_err(|e| anyhow!("invalid fixed_location in config: {}", e))
    }

    pub fn ip_lookup_url(&self) -> &str {
        self.ip_lookup_url.as_deref().unwrap_or(DEFAULT_IP_LOOKUP_URL)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.unwrap_or(30).max(1))
    }

    pub fn high_accuracy(&self) -> bool {
        self.high_accuracy.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, Config::new());
        assert_eq!(config.location_provider(), LocationProvider::Ip);
        assert_eq!(config.text_model(), DEFAULT_TEXT_MODEL);
        assert_eq!(config.locale(), Locale::Bengali);
        assert!(config.high_accuracy());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            location_provider: Some("fixed".to_string()),
            fixed_location: Some("23.81, 90.41".to_string()),
            locale: Some(Locale::English),
            max_retries: Some(5),
            ..Config::new()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.location_provider(), LocationProvider::Fixed);
        assert_eq!(
            loaded.fixed_location().unwrap(),
            Some(Coordinate::new_unchecked(23.81, 90.41))
        );
        // Retries are capped at one.
        assert_eq!(loaded.max_retries(), 1);
    }

    #[test]
    fn test_load_accepts_short_locale_code() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"gemini_api_key":"K","locale":"bn"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.locale(), Locale::Bengali);
        assert_eq!(config.gemini_api_key.as_deref(), Some("K"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"locale":"klingon"}"#).unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid config"));
    }

    #[test]
    fn test_invalid_fixed_location_is_an_error() {
        let config = Config {
            fixed_location: Some("north pole".to_string()),
            ..Config::new()
        };
        assert!(config.fixed_location().is_err());
    }
}
