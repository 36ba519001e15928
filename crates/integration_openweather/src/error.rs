//! OpenWeatherMap integration errors

use thiserror::Error;

/// Errors produced by the weather fetcher and the icon cache
#[derive(Debug, Error)]
pub enum WeatherError {
    /// A request URL could not be built from its parts
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Connection to the provider failed (DNS, refused, reset)
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The request did not complete within the transport timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Request to the provider failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The provider rejected the credential
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Service is temporarily unavailable
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Response body did not match the expected schema or format
    #[error("Decode error: {0}")]
    Decode(String),

    /// Icon not present (or not usable) in the local cache
    #[error("Cache miss: {0}")]
    CacheMiss(String),

    /// Writing an icon to the cache directory failed
    #[error("Persist failed: {0}")]
    Persist(String),

    /// The cache directory could not be read
    #[error("Cache storage error: {0}")]
    Storage(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl WeatherError {
    /// Whether the error originated in the network layer
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_)
                | Self::Timeout(_)
                | Self::RequestFailed(_)
                | Self::Unauthorized(_)
                | Self::RateLimitExceeded
                | Self::ServiceUnavailable(_)
        )
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ConnectionFailed(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::RequestFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for WeatherError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
