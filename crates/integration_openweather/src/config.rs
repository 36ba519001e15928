//! Configuration for the OpenWeatherMap integration

use std::path::PathBuf;

use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::WeatherError;

/// Sub-path below the platform cache directory holding icon files
const CACHE_SUBDIR: &str = "skycast/icons";

/// OpenWeatherMap service configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct OpenWeatherConfig {
    /// Weather data API base URL (default: <http://api.openweathermap.org>)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Icon host base URL (default: <http://openweathermap.org>)
    #[serde(default = "default_icon_base_url")]
    pub icon_base_url: String,

    /// Provider-issued API key, required for weather data requests
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Icon cache directory (default: platform cache dir + `skycast/icons`)
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

fn default_api_base_url() -> String {
    "http://api.openweathermap.org".to_string()
}

fn default_icon_base_url() -> String {
    "http://openweathermap.org".to_string()
}

const fn default_timeout() -> u64 {
    30
}

impl Default for OpenWeatherConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            icon_base_url: default_icon_base_url(),
            api_key: None,
            timeout_secs: default_timeout(),
            cache_dir: None,
        }
    }
}

impl std::fmt::Debug for OpenWeatherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherConfig")
            .field("api_base_url", &self.api_base_url)
            .field("icon_base_url", &self.icon_base_url)
            .field(
                "api_key",
                &if self.api_key.is_some() {
                    Some("[REDACTED]")
                } else {
                    None
                },
            )
            .field("timeout_secs", &self.timeout_secs)
            .field("cache_dir", &self.cache_dir)
            .finish()
    }
}

impl OpenWeatherConfig {
    /// Set the API key
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(api_key.into()));
        self
    }

    /// Set the icon cache directory
    #[must_use]
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }

    /// Exposed API key, if one is configured and non-blank
    pub(crate) fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_ref()
            .map(|key| key.expose_secret())
            .filter(|key| !key.trim().is_empty())
    }

    /// Parsed weather API base URL
    pub(crate) fn api_base(&self) -> Result<Url, WeatherError> {
        parse_base_url("api_base_url", &self.api_base_url)
    }

    /// Parsed icon host base URL
    pub(crate) fn icon_base(&self) -> Result<Url, WeatherError> {
        parse_base_url("icon_base_url", &self.icon_base_url)
    }

    /// Validate the configuration
    ///
    /// Both base URLs must be absolute http(s) URLs and the timeout must be non-zero.
    pub fn validate(&self) -> Result<(), WeatherError> {
        self.api_base()?;
        self.icon_base()?;
        if self.timeout_secs == 0 {
            return Err(WeatherError::Configuration(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the icon cache directory
    ///
    /// Falls back to the system temp directory when the platform has no cache dir.
    #[must_use]
    pub fn resolve_cache_dir(&self) -> PathBuf {
        if let Some(dir) = &self.cache_dir {
            return dir.clone();
        }
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(CACHE_SUBDIR)
    }
}

fn parse_base_url(field: &str, raw: &str) -> Result<Url, WeatherError> {
    let url = Url::parse(raw.trim_end_matches('/'))
        .map_err(|e| WeatherError::Configuration(format!("{field} <{raw}>: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(WeatherError::Configuration(format!(
            "{field} <{raw}>: unsupported scheme '{}'",
            url.scheme()
        )));
    }
    Ok(url)
}
