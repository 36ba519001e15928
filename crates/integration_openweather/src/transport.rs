//! HTTP transport port
//!
//! The weather fetcher and the icon cache only need a plain asynchronous GET.
//! `ReqwestTransport` is the production implementation; tests substitute mocks.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
#[cfg(test)]
use mockall::automock;
use reqwest::{Client, Url};
use tracing::debug;

use crate::config::OpenWeatherConfig;
use crate::error::WeatherError;

/// Status and body of a completed GET request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: Bytes,
}

impl HttpResponse {
    /// Create a response from a status code and body
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Port for issuing HTTP GET requests
///
/// Implementations return `Ok` for every response that arrived, regardless of
/// status; only failures to obtain a response at all are errors.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Fetch the given URL
    async fn get(&self, url: &Url) -> Result<HttpResponse, WeatherError>;
}

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport using the timeout from the given configuration
    ///
    /// # Errors
    ///
    /// Returns `WeatherError::Configuration` if the HTTP client cannot be initialized.
    pub fn new(config: &OpenWeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("skycast/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                WeatherError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { client })
    }

    /// Wrap an existing `reqwest` client
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse, WeatherError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        debug!(%url, status, bytes = body.len(), "GET completed");

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range() {
        assert!(HttpResponse::new(200, Bytes::new()).is_success());
        assert!(HttpResponse::new(204, Bytes::new()).is_success());
        assert!(!HttpResponse::new(199, Bytes::new()).is_success());
        assert!(!HttpResponse::new(301, Bytes::new()).is_success());
        assert!(!HttpResponse::new(404, Bytes::new()).is_success());
    }

    #[test]
    fn transport_creation() {
        assert!(ReqwestTransport::new(&OpenWeatherConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let config = OpenWeatherConfig {
            timeout_secs: 2,
            ..Default::default()
        };
        let transport = ReqwestTransport::new(&config).expect("client creation should succeed");
        // Port 9 (discard) on localhost is expected to refuse connections
        let url = Url::parse("http://127.0.0.1:9/img/w/01d.png").expect("valid url");

        let err = transport.get(&url).await.expect_err("should fail");
        assert!(err.is_transport(), "unexpected error: {err:?}");
    }
}
