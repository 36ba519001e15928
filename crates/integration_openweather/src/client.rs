//! OpenWeatherMap weather client
//!
//! Fetches current weather for a coordinate. Every call is a fresh network
//! round-trip; failures are returned to the caller unchanged.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use tracing::{debug, instrument, warn};

use crate::config::OpenWeatherConfig;
use crate::error::WeatherError;
use crate::models::{ApiErrorBody, ApiResponse, WeatherInfo};
use crate::transport::{HttpResponse, HttpTransport, ReqwestTransport};

/// Path of the current-weather endpoint below the API base URL
const WEATHER_PATH: &str = "data/2.5/weather";

/// Weather client trait for fetching weather data
#[async_trait]
pub trait WeatherClient: Send + Sync {
    /// Get current weather for a location
    ///
    /// Coordinates are passed through to the provider unvalidated.
    async fn get_weather(&self, latitude: f64, longitude: f64)
    -> Result<WeatherInfo, WeatherError>;

    /// Check if the weather service is reachable and accepts the credential
    async fn is_healthy(&self) -> bool;
}

/// OpenWeatherMap HTTP client implementation
pub struct OpenWeatherClient {
    transport: Arc<dyn HttpTransport>,
    api_base: Url,
    api_key: String,
}

impl std::fmt::Debug for OpenWeatherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherClient")
            .field("api_base", &self.api_base.as_str())
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl OpenWeatherClient {
    /// Create a new client backed by `reqwest`
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the API key is missing,
    /// or the HTTP client cannot be initialized.
    pub fn new(config: &OpenWeatherConfig) -> Result<Self, WeatherError> {
        let transport = ReqwestTransport::new(config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a new client over an existing transport
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the API key is missing.
    pub fn with_transport(
        config: &OpenWeatherConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, WeatherError> {
        config.validate()?;

        let api_key = config
            .api_key()
            .ok_or_else(|| {
                WeatherError::Configuration("an OpenWeatherMap API key is required".to_string())
            })?
            .to_string();

        Ok(Self {
            transport,
            api_base: config.api_base()?,
            api_key,
        })
    }

    /// Build the current-weather URL for a coordinate
    fn build_weather_url(&self, latitude: f64, longitude: f64) -> Result<Url, WeatherError> {
        let endpoint = format!(
            "{}/{WEATHER_PATH}",
            self.api_base.as_str().trim_end_matches('/')
        );
        Url::parse_with_params(
            &endpoint,
            &[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("appid", self.api_key.clone()),
            ],
        )
        .map_err(|e| WeatherError::InvalidUrl(format!("{endpoint}: {e}")))
    }

    /// Map a non-success response to an error
    fn check_status(response: &HttpResponse) -> Result<(), WeatherError> {
        if response.is_success() {
            return Ok(());
        }

        let status = response.status;
        let detail = serde_json::from_slice::<ApiErrorBody>(&response.body)
            .ok()
            .and_then(|body| body.message)
            .map_or_else(|| format!("HTTP {status}"), |msg| format!("HTTP {status}: {msg}"));

        Err(match status {
            401 => WeatherError::Unauthorized(detail),
            429 => WeatherError::RateLimitExceeded,
            500..=599 => WeatherError::ServiceUnavailable(detail),
            _ => WeatherError::RequestFailed(detail),
        })
    }

    /// Decode a weather payload
    fn parse_weather(body: &[u8]) -> Result<WeatherInfo, WeatherError> {
        let api_response: ApiResponse = serde_json::from_slice(body)?;
        WeatherInfo::try_from(api_response)
    }
}

#[async_trait]
impl WeatherClient for OpenWeatherClient {
    #[instrument(skip(self), fields(lat = %latitude, lon = %longitude))]
    async fn get_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherInfo, WeatherError> {
        let url = self.build_weather_url(latitude, longitude)?;
        debug!(endpoint = %url.path(), "Fetching current weather");

        let response = self.transport.get(&url).await?;
        Self::check_status(&response)?;

        Self::parse_weather(&response.body).inspect_err(|e| {
            warn!(error = %e, "Weather payload did not match the expected schema");
        })
    }

    async fn is_healthy(&self) -> bool {
        // Health probe against a fixed coordinate (Utrecht)
        self.get_weather(52.09, 5.12).await.is_ok()
    }
}
