//! CLI configuration loading
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. `skycast.toml` in the working directory, or the file given with `--config`
//! 3. Environment variables, e.g. `SKYCAST_OPENWEATHER__API_KEY`

use std::path::Path;

use integration_openweather::OpenWeatherConfig;
use serde::Deserialize;
use tracing::debug;

/// Config file looked up in the working directory when no path is given
const DEFAULT_CONFIG_NAME: &str = "skycast";

/// Prefix of configuration environment variables
const ENV_PREFIX: &str = "SKYCAST";

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// OpenWeatherMap settings
    #[serde(default)]
    pub openweather: OpenWeatherConfig,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// An explicitly given file must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let file = path.map_or_else(
            || config::File::with_name(DEFAULT_CONFIG_NAME).required(false),
            |p| config::File::from(p).required(true),
        );

        let builder = config::Config::builder()
            .add_source(file)
            // Override with environment variables (e.g., SKYCAST_OPENWEATHER__TIMEOUT_SECS)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        debug!(?config, "Loaded configuration");
        Ok(config)
    }

    /// Apply command-line overrides
    #[must_use]
    pub fn with_overrides(
        mut self,
        api_key: Option<String>,
        cache_dir: Option<std::path::PathBuf>,
    ) -> Self {
        if let Some(key) = api_key {
            self.openweather = self.openweather.with_api_key(key);
        }
        if let Some(dir) = cache_dir {
            self.openweather = self.openweather.with_cache_dir(dir);
        }
        self
    }
}
